//! Sequential collect → update training loop.

use std::path::PathBuf;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::buffer::RolloutBuffer;
use super::error::TrainingError;
use super::ppo::PpoTrainer;
use super::stats::UpdateStats;
use crate::env::{DeploymentEnv, EpisodeSummary, Observation};

/// Training loop settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunnerConfig {
    /// Environment steps to collect in total.
    pub total_timesteps: usize,
    /// Steps collected between policy updates.
    pub update_interval: usize,
    /// Episodes between progress log lines.
    pub log_interval: usize,
    /// Steps between checkpoints; `None` disables periodic saving.
    pub save_interval: Option<usize>,
    /// Where checkpoints go; `None` disables checkpointing entirely.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 100_000,
            update_interval: 2048,
            log_interval: 10,
            save_interval: Some(10_000),
            checkpoint_dir: None,
        }
    }
}

/// Summary of a finished [`Runner::train`] call.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// Completed episodes.
    pub episodes: usize,
    /// Policy updates performed.
    pub updates: usize,
    /// Environment steps collected.
    pub total_steps: usize,
    /// Reward of every completed episode, in order.
    pub episode_rewards: Vec<f64>,
    /// Statistics of the last update.
    pub last_update: Option<UpdateStats>,
}

impl TrainingReport {
    /// Mean reward of the last `n` episodes, if any finished.
    pub fn recent_mean_reward(&self, n: usize) -> Option<f64> {
        let start = self.episode_rewards.len().saturating_sub(n);
        let recent = &self.episode_rewards[start..];
        if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<f64>() / recent.len() as f64)
        }
    }
}

/// Drives one environment and one trainer through the PPO loop.
///
/// Collection, update, and checkpointing run strictly one after another
/// on the caller's thread.
pub struct Runner {
    env: DeploymentEnv,
    trainer: PpoTrainer,
    buffer: RolloutBuffer,
    config: RunnerConfig,
    rng: StdRng,
    observation: Observation,
    episodes: Vec<EpisodeSummary>,
    total_steps: usize,
}

impl Runner {
    /// Creates a runner and resets the environment.
    ///
    /// # Arguments
    ///
    /// * `env` - Environment to collect from
    /// * `trainer` - Trainer whose policy acts in `env`
    /// * `config` - Loop settings
    /// * `seed` - Seed of the action-sampling RNG
    pub fn new(
        mut env: DeploymentEnv,
        trainer: PpoTrainer,
        config: RunnerConfig,
        seed: u64,
    ) -> Result<Self, TrainingError> {
        if config.update_interval == 0 {
            return Err(TrainingError::InvalidConfig(
                "update_interval must be at least 1".into(),
            ));
        }
        if config.save_interval == Some(0) {
            return Err(TrainingError::InvalidConfig(
                "save_interval must be at least 1".into(),
            ));
        }
        let policy = trainer.policy();
        if policy.obs_dim() != env.observation_dim() || policy.action_dim() != env.action_dim() {
            return Err(TrainingError::InvalidConfig(format!(
                "policy is {}→{} but environment is {}→{}",
                policy.obs_dim(),
                policy.action_dim(),
                env.observation_dim(),
                env.action_dim()
            )));
        }

        let observation = env.reset();
        Ok(Self {
            env,
            trainer,
            buffer: RolloutBuffer::new(),
            config,
            rng: StdRng::seed_from_u64(seed),
            observation,
            episodes: Vec::new(),
            total_steps: 0,
        })
    }

    /// Collects `n_steps` transitions into the buffer.
    ///
    /// Episodes continue across calls; the environment is reset whenever one
    /// ends. Returns the summaries of episodes finished during this call.
    pub fn collect(&mut self, n_steps: usize) -> Result<Vec<EpisodeSummary>, TrainingError> {
        let mut finished = Vec::new();
        for _ in 0..n_steps {
            let sample = self.trainer.policy().act(&self.observation, &mut self.rng)?;
            let result = self.env.step(sample.action);
            let done = result.done();

            let state = std::mem::replace(&mut self.observation, result.observation);
            self.buffer
                .add(state, sample.action, result.reward, sample.log_prob, sample.value, done);
            self.total_steps += 1;

            if done {
                if let Some(summary) = result.episode {
                    self.record_episode(summary);
                    finished.push(summary);
                }
                self.observation = self.env.reset();
            }
        }
        Ok(finished)
    }

    /// Runs collect → update → clear until `total_timesteps` steps were taken.
    pub fn train(&mut self) -> Result<TrainingReport, TrainingError> {
        let mut report = TrainingReport::default();
        let start_episodes = self.episodes.len();

        while report.total_steps < self.config.total_timesteps {
            let n = self
                .config
                .update_interval
                .min(self.config.total_timesteps - report.total_steps);
            let before = self.total_steps;
            self.collect(n)?;
            report.total_steps += n;

            let stats = self.trainer.update(&self.buffer)?;
            self.buffer.clear();
            report.updates += 1;
            report.last_update = Some(stats);

            if let (Some(interval), Some(dir)) = (self.config.save_interval, &self.config.checkpoint_dir) {
                if before / interval != self.total_steps / interval {
                    std::fs::create_dir_all(dir)?;
                    let path = dir.join(format!("ppo_checkpoint_{}.safetensors", self.total_steps));
                    self.trainer.save(path)?;
                }
            }
        }

        if let Some(dir) = &self.config.checkpoint_dir {
            std::fs::create_dir_all(dir)?;
            self.trainer.save(dir.join("ppo_final.safetensors"))?;
        }

        report.episode_rewards = self.episodes[start_episodes..]
            .iter()
            .map(|e| e.reward)
            .collect();
        report.episodes = report.episode_rewards.len();
        info!(
            "training finished: {} episodes, {} updates, {} steps",
            report.episodes, report.updates, report.total_steps
        );
        Ok(report)
    }

    fn record_episode(&mut self, summary: EpisodeSummary) {
        self.episodes.push(summary);
        let count = self.episodes.len();
        if self.config.log_interval > 0 && count % self.config.log_interval == 0 {
            let recent = &self.episodes[count - self.config.log_interval..];
            let n = recent.len() as f64;
            info!(
                "episode {} | steps {} | avg reward {:.2} | avg length {:.1}",
                count,
                self.total_steps,
                recent.iter().map(|e| e.reward).sum::<f64>() / n,
                recent.iter().map(|e| e.length as f64).sum::<f64>() / n
            );
        }
    }

    pub fn env(&self) -> &DeploymentEnv {
        &self.env
    }

    pub fn trainer(&self) -> &PpoTrainer {
        &self.trainer
    }

    pub fn trainer_mut(&mut self) -> &mut PpoTrainer {
        &mut self.trainer
    }

    pub fn buffer(&self) -> &RolloutBuffer {
        &self.buffer
    }

    /// Every episode finished so far.
    pub fn episodes(&self) -> &[EpisodeSummary] {
        &self.episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Consumes the runner, returning the trainer.
    pub fn into_trainer(self) -> PpoTrainer {
        self.trainer
    }
}
