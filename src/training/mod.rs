//! PPO training infrastructure.
//!
//! Provides the rollout buffer, GAE computation, the Adam optimizer, the PPO
//! trainer with single-file checkpoints, and the sequential training loop.

pub mod buffer;
pub mod checkpoint;
pub mod error;
pub mod gae;
pub mod optimizer;
pub mod ppo;
pub mod runner;
pub mod stats;


pub use buffer::{RolloutBatch, RolloutBuffer};
pub use error::TrainingError;
pub use gae::{compute_gae, normalize_advantages, GaeEstimate};
pub use optimizer::{clip_grad_norm, Adam, AdamConfig};
pub use ppo::{ppo_losses, PpoLosses, PpoTrainer, TrainingConfig};
pub use runner::{Runner, RunnerConfig, TrainingReport};
pub use stats::{LossAccumulator, UpdateStats};
