//! Actor-critic network built on candle.
//!
//! A shared tanh MLP trunk feeds two heads: the actor emits log-probabilities
//! over the `num_nodes + 1` discrete actions, the critic emits one state value.

use candle_core::{Device, Tensor, Var, D};
use candle_nn::{ops, Linear, Module};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::PolicyError;
use crate::env::Observation;

/// Architecture hyperparameters of [`ActorCritic`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolicyConfig {
    /// Width of both trunk layers.
    pub hidden_dim: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { hidden_dim: 64 }
    }
}

/// One sampled action together with the quantities PPO stores for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSample {
    pub action: usize,
    /// Log-probability of `action` under the sampling distribution.
    pub log_prob: f64,
    /// Critic estimate for the observation.
    pub value: f64,
}

/// Differentiable re-evaluation of stored actions, one entry per sample.
#[derive(Debug)]
pub struct PolicyEvaluation {
    /// `[batch]` log-probabilities of the given actions.
    pub log_probs: Tensor,
    /// `[batch]` state values.
    pub values: Tensor,
    /// `[batch]` entropy of each action distribution.
    pub entropy: Tensor,
}

/// A linear layer whose parameters are owned [`Var`]s.
struct Layer {
    weight: Var,
    bias: Var,
    linear: Linear,
}

impl Layer {
    /// Uniform init in `±1/sqrt(in_dim)` for weights and bias.
    fn new(in_dim: usize, out_dim: usize, rng: &mut StdRng, device: &Device) -> Result<Self, PolicyError> {
        let bound = 1.0 / (in_dim as f32).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);

        let w: Vec<f32> = (0..in_dim * out_dim).map(|_| dist.sample(rng)).collect();
        let b: Vec<f32> = (0..out_dim).map(|_| dist.sample(rng)).collect();
        let weight = Var::from_tensor(&Tensor::from_vec(w, (out_dim, in_dim), device)?)?;
        let bias = Var::from_tensor(&Tensor::from_vec(b, out_dim, device)?)?;
        let linear = Linear::new(weight.as_tensor().clone(), Some(bias.as_tensor().clone()));

        Ok(Self {
            weight,
            bias,
            linear,
        })
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.linear.forward(xs)
    }
}

/// Shared-trunk actor-critic function approximator.
///
/// Architecture: `obs_dim → hidden → hidden` (tanh) shared trunk, then
/// `hidden → action_dim` (log-softmax) for the actor and `hidden → 1` for
/// the critic.
pub struct ActorCritic {
    trunk: [Layer; 2],
    actor: Layer,
    critic: Layer,
    obs_dim: usize,
    action_dim: usize,
    device: Device,
}

impl ActorCritic {
    /// Creates a new network on the CPU.
    ///
    /// # Arguments
    ///
    /// * `obs_dim` - Observation length
    /// * `action_dim` - Number of discrete actions
    /// * `config` - Architecture hyperparameters
    /// * `seed` - Seed for parameter initialisation
    pub fn new(
        obs_dim: usize,
        action_dim: usize,
        config: &PolicyConfig,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        let device = Device::Cpu;
        let mut rng = StdRng::seed_from_u64(seed);
        let h = config.hidden_dim;

        let trunk = [
            Layer::new(obs_dim, h, &mut rng, &device)?,
            Layer::new(h, h, &mut rng, &device)?,
        ];
        let actor = Layer::new(h, action_dim, &mut rng, &device)?;
        let critic = Layer::new(h, 1, &mut rng, &device)?;

        Ok(Self {
            trunk,
            actor,
            critic,
            obs_dim,
            action_dim,
            device,
        })
    }

    /// Forward pass over a `[batch, obs_dim]` tensor.
    ///
    /// Returns `([batch, action_dim]` log-probabilities, `[batch]` values).
    pub fn forward(&self, states: &Tensor) -> Result<(Tensor, Tensor), PolicyError> {
        let h = self.trunk[0].forward(states)?.tanh()?;
        let h = self.trunk[1].forward(&h)?.tanh()?;
        let log_probs = ops::log_softmax(&self.actor.forward(&h)?, D::Minus1)?;
        let values = self.critic.forward(&h)?.squeeze(D::Minus1)?;
        Ok((log_probs, values))
    }

    /// Samples one action for a single observation.
    ///
    /// Parameters are only read; no gradient is ever taken through this path.
    pub fn act<R: Rng + ?Sized>(
        &self,
        obs: &Observation,
        rng: &mut R,
    ) -> Result<ActionSample, PolicyError> {
        let (log_probs, value) = self.single(obs)?;
        let probs: Vec<f64> = log_probs.iter().map(|&lp| (lp as f64).exp()).collect();
        let dist =
            WeightedIndex::new(&probs).map_err(|e| PolicyError::InvalidDistribution(e.to_string()))?;
        let action = dist.sample(rng);

        Ok(ActionSample {
            action,
            log_prob: log_probs[action] as f64,
            value: value as f64,
        })
    }

    /// Most probable action for a single observation.
    pub fn act_greedy(&self, obs: &Observation) -> Result<usize, PolicyError> {
        let (log_probs, _) = self.single(obs)?;
        let best = log_probs
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &lp)| {
                if lp > best.1 {
                    (i, lp)
                } else {
                    best
                }
            });
        Ok(best.0)
    }

    /// Action probabilities and value for a single observation.
    pub fn probabilities(&self, obs: &Observation) -> Result<(Vec<f32>, f32), PolicyError> {
        let (log_probs, value) = self.single(obs)?;
        Ok((log_probs.iter().map(|lp| lp.exp()).collect(), value))
    }

    /// Re-evaluates stored actions under the current parameters.
    ///
    /// # Arguments
    ///
    /// * `states` - `[batch, obs_dim]` f32 tensor
    /// * `actions` - `[batch]` u32 tensor of action indices
    pub fn evaluate(&self, states: &Tensor, actions: &Tensor) -> Result<PolicyEvaluation, PolicyError> {
        let (log_probs, values) = self.forward(states)?;
        let taken = log_probs
            .gather(&actions.unsqueeze(1)?, D::Minus1)?
            .squeeze(D::Minus1)?;
        let entropy = log_probs.exp()?.mul(&log_probs)?.sum(D::Minus1)?.neg()?;

        Ok(PolicyEvaluation {
            log_probs: taken,
            values,
            entropy,
        })
    }

    /// Trainable parameters with stable names, in a fixed order.
    pub fn named_vars(&self) -> Vec<(String, Var)> {
        let layers = [
            ("trunk.0", &self.trunk[0]),
            ("trunk.1", &self.trunk[1]),
            ("actor", &self.actor),
            ("critic", &self.critic),
        ];
        layers
            .iter()
            .flat_map(|(prefix, layer)| {
                [
                    (format!("{}.weight", prefix), layer.weight.clone()),
                    (format!("{}.bias", prefix), layer.bias.clone()),
                ]
            })
            .collect()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.named_vars()
            .iter()
            .map(|(_, v)| v.as_tensor().elem_count())
            .sum()
    }

    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn single(&self, obs: &Observation) -> Result<(Vec<f32>, f32), PolicyError> {
        if obs.len() != self.obs_dim {
            return Err(PolicyError::ObservationDim {
                expected: self.obs_dim,
                found: obs.len(),
            });
        }
        let states = Tensor::from_slice(obs.as_slice(), (1, self.obs_dim), &self.device)?;
        let (log_probs, values) = self.forward(&states)?;
        let log_probs: Vec<f32> = log_probs.squeeze(0)?.to_vec1()?;
        let value: f32 = values.squeeze(0)?.to_scalar()?;
        Ok((log_probs, value))
    }
}
