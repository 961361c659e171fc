//! PPO trainer (clipped surrogate objective, clipped value loss).

use std::path::Path;

use candle_core::{Tensor, Var};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::buffer::RolloutBuffer;
use super::checkpoint;
use super::error::TrainingError;
use super::gae::normalize_advantages;
use super::optimizer::{clip_grad_norm, Adam, AdamConfig};
use super::stats::{LossAccumulator, UpdateStats};
use crate::policy::{ActorCritic, PolicyEvaluation};

/// Training hyperparameters for PPO.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainingConfig {
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Discount factor γ.
    pub gamma: f64,
    /// GAE λ parameter.
    pub gae_lambda: f64,
    /// PPO clip parameter ε, also used to clip the value update.
    pub clip_epsilon: f64,
    /// Value loss coefficient.
    pub value_coef: f64,
    /// Entropy bonus coefficient.
    pub entropy_coef: f64,
    /// Maximum global gradient norm.
    pub max_grad_norm: f64,
    /// Number of passes over the rollout per update.
    pub update_epochs: u32,
    /// Mini-batch size for PPO updates.
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 3e-4,
            gamma: 0.99,
            gae_lambda: 0.95,
            clip_epsilon: 0.2,
            value_coef: 0.5,
            entropy_coef: 0.01,
            max_grad_norm: 0.5,
            update_epochs: 4,
            batch_size: 64,
        }
    }
}

impl TrainingConfig {
    /// Checks that every hyperparameter is in range.
    pub fn validate(&self) -> Result<(), TrainingError> {
        let invalid = |msg: &str| Err(TrainingError::InvalidConfig(msg.to_string()));
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid("learning_rate must be positive");
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid("gamma must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.gae_lambda) {
            return invalid("gae_lambda must be in [0, 1]");
        }
        if !(self.clip_epsilon > 0.0 && self.clip_epsilon < 1.0) {
            return invalid("clip_epsilon must be in (0, 1)");
        }
        if self.value_coef < 0.0 || self.entropy_coef < 0.0 {
            return invalid("loss coefficients must be non-negative");
        }
        if self.max_grad_norm <= 0.0 {
            return invalid("max_grad_norm must be positive");
        }
        if self.update_epochs == 0 {
            return invalid("update_epochs must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        Ok(())
    }
}

/// Scalar loss tensors of one minibatch.
#[derive(Debug)]
pub struct PpoLosses {
    /// Clipped surrogate loss.
    pub policy: Tensor,
    /// Clipped value loss.
    pub value: Tensor,
    /// Mean entropy (positive).
    pub entropy: Tensor,
    /// `policy + value_coef·value − entropy_coef·entropy`.
    pub total: Tensor,
}

/// Computes the PPO losses for one minibatch.
///
/// # Arguments
///
/// * `eval` - Current-policy evaluation of the minibatch
/// * `old_log_probs` - Log-probabilities recorded at collection time
/// * `old_values` - Values recorded at collection time
/// * `advantages` - Normalized advantages
/// * `returns` - GAE returns
/// * `config` - Supplies `clip_epsilon`, `value_coef` and `entropy_coef`
pub fn ppo_losses(
    eval: &PolicyEvaluation,
    old_log_probs: &Tensor,
    old_values: &Tensor,
    advantages: &Tensor,
    returns: &Tensor,
    config: &TrainingConfig,
) -> candle_core::Result<PpoLosses> {
    let eps = config.clip_epsilon as f32;

    // Clipped surrogate
    let ratio = eval.log_probs.sub(old_log_probs)?.exp()?;
    let surr1 = ratio.mul(advantages)?;
    let surr2 = ratio.clamp(1.0 - eps, 1.0 + eps)?.mul(advantages)?;
    let policy = surr1.minimum(&surr2)?.mean_all()?.neg()?;

    // Clipped value loss
    let clipped = old_values.add(&eval.values.sub(old_values)?.clamp(-eps, eps)?)?;
    let unclipped_err = eval.values.sub(returns)?.sqr()?;
    let clipped_err = clipped.sub(returns)?.sqr()?;
    let value = unclipped_err.maximum(&clipped_err)?.mean_all()?;

    let entropy = eval.entropy.mean_all()?;

    let total = policy
        .add(&value.affine(config.value_coef, 0.0)?)?
        .add(&entropy.neg()?.affine(config.entropy_coef, 0.0)?)?;

    Ok(PpoLosses {
        policy,
        value,
        entropy,
        total,
    })
}

/// PPO trainer owning the policy, its optimizer, and the shuffling RNG.
pub struct PpoTrainer {
    policy: ActorCritic,
    optimizer: Adam,
    vars: Vec<Var>,
    config: TrainingConfig,
    rng: StdRng,
}

impl PpoTrainer {
    /// Creates a new trainer.
    ///
    /// # Arguments
    ///
    /// * `policy` - Network to train
    /// * `config` - Training hyperparameters
    /// * `seed` - Seed of the minibatch shuffling RNG
    pub fn new(policy: ActorCritic, config: TrainingConfig, seed: u64) -> Result<Self, TrainingError> {
        config.validate()?;
        let named = policy.named_vars();
        let vars = named.iter().map(|(_, v)| v.clone()).collect();
        let optimizer = Adam::new(
            named,
            AdamConfig {
                lr: config.learning_rate,
                ..AdamConfig::default()
            },
        )?;

        Ok(Self {
            policy,
            optimizer,
            vars,
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Runs `update_epochs` passes of minibatch PPO over the buffer.
    ///
    /// The buffer is only read; clearing it is the caller's job.
    pub fn update(&mut self, buffer: &RolloutBuffer) -> Result<UpdateStats, TrainingError> {
        if buffer.is_empty() {
            return Err(TrainingError::EmptyRollout);
        }

        // 1. Batch, GAE and advantage normalisation
        let batch = buffer.get();
        let gae = buffer.compute_returns_and_advantages(self.config.gamma, self.config.gae_lambda);
        let advantages = normalize_advantages(&gae.advantages);

        let n = batch.len();
        let device = self.policy.device().clone();
        let to_f32 = |xs: &[f64]| xs.iter().map(|&x| x as f32).collect::<Vec<f32>>();
        let states = Tensor::from_vec(batch.states, (n, batch.obs_dim), &device)?;
        let actions = Tensor::from_vec(batch.actions, n, &device)?;
        let old_log_probs = Tensor::from_vec(to_f32(&batch.log_probs), n, &device)?;
        let old_values = Tensor::from_vec(to_f32(&batch.values), n, &device)?;
        let advantages = Tensor::from_vec(to_f32(&advantages), n, &device)?;
        let returns = Tensor::from_vec(to_f32(&gae.returns), n, &device)?;

        // 2. Minibatch epochs
        let mut acc = LossAccumulator::new();
        let mut indices: Vec<u32> = (0..n as u32).collect();
        for epoch in 0..self.config.update_epochs {
            indices.shuffle(&mut self.rng);
            for chunk in indices.chunks(self.config.batch_size) {
                let idx = Tensor::from_slice(chunk, chunk.len(), &device)?;
                let eval = self
                    .policy
                    .evaluate(&states.index_select(&idx, 0)?, &actions.index_select(&idx, 0)?)?;
                let losses = ppo_losses(
                    &eval,
                    &old_log_probs.index_select(&idx, 0)?,
                    &old_values.index_select(&idx, 0)?,
                    &advantages.index_select(&idx, 0)?,
                    &returns.index_select(&idx, 0)?,
                    &self.config,
                )?;

                let mut grads = losses.total.backward()?;
                let norm = clip_grad_norm(&mut grads, &self.vars, self.config.max_grad_norm)?;
                trace!("epoch {} minibatch of {}: grad norm {:.4}", epoch, chunk.len(), norm);
                self.optimizer.step(&grads)?;

                acc.add(
                    losses.policy.to_scalar::<f32>()? as f64,
                    losses.value.to_scalar::<f32>()? as f64,
                    losses.entropy.to_scalar::<f32>()? as f64,
                );
            }
        }

        let stats = acc.finish();
        debug!(
            "ppo update over {} transitions: policy_loss={:.4} value_loss={:.4} entropy={:.4}",
            n, stats.policy_loss, stats.value_loss, stats.entropy
        );
        Ok(stats)
    }

    /// Saves policy parameters and optimizer state to one file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TrainingError> {
        checkpoint::save(path.as_ref(), &self.policy, &self.optimizer)
    }

    /// Restores policy parameters and optimizer state saved by [`PpoTrainer::save`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), TrainingError> {
        checkpoint::load(path.as_ref(), &self.policy, &mut self.optimizer)
    }

    pub fn policy(&self) -> &ActorCritic {
        &self.policy
    }

    pub fn optimizer(&self) -> &Adam {
        &self.optimizer
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Consumes the trainer, returning the trained network.
    pub fn into_policy(self) -> ActorCritic {
        self.policy
    }
}
