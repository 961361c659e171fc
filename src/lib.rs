//! deploy-ppo - service deployment under node failures, trained with PPO
//!
//! A discrete-event environment where agents arrive at a small cluster of
//! failing nodes, an actor-critic policy that decides where each arrival is
//! deployed, and the PPO machinery (rollout buffer, GAE, clipped objective,
//! checkpoints) that trains it.

pub mod env;
pub mod metrics;
pub mod policy;
pub mod training;

pub use env::{DeploymentEnv, EnvConfig, EnvError, EventKind, Observation, StepResult};
pub use metrics::EvaluationMetrics;
pub use policy::{ActorCritic, Policy, PolicyConfig, PolicyError};
pub use training::{PpoTrainer, RolloutBuffer, Runner, RunnerConfig, TrainingConfig, TrainingError};
