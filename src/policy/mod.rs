//! Policies for the deployment environment.
//!
//! - [`ActorCritic`]: the trainable network
//! - [`NeuralPolicy`]: adapter that drives the environment with a network
//! - [`RandomPolicy`] and [`LeastLoadedPolicy`]: baselines

pub mod error;
pub mod heuristic;
pub mod network;
pub mod neural;
pub mod random;
pub mod trait_;

pub use error::PolicyError;
pub use heuristic::LeastLoadedPolicy;
pub use network::{ActionSample, ActorCritic, PolicyConfig, PolicyEvaluation};
pub use neural::NeuralPolicy;
pub use random::RandomPolicy;
pub use trait_::Policy;
