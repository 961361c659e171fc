//! Service deployment environment.
//!
//! Models a small cluster of compute nodes that fail and recover while
//! agents arrive and depart. The agent decides where each arriving agent is
//! deployed, or rejects it.

pub mod cluster;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;
pub mod observation;
pub mod reward;

pub use cluster::Cluster;
pub use config::{EnvConfig, RewardConfig};
pub use environment::{DeploymentEnv, EpisodeSummary, StepResult};
pub use error::EnvError;
pub use event::EventKind;
pub use observation::{Observation, ObservationBuilder};
pub use reward::{RewardComputer, StepOutcome};
