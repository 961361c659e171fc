//! Policy trait for the deployment environment.

use super::error::PolicyError;
use crate::env::Observation;

/// A policy that picks one action per observation.
///
/// Actions index the environment's action space:
/// - `0..num_nodes`: deploy an arriving agent to that node
/// - `num_nodes`: reject it
pub trait Policy: Send + Sync {
    /// Selects an action for the given observation.
    ///
    /// # Arguments
    ///
    /// * `observation` - Observation produced by the environment
    fn select_action(&mut self, observation: &Observation) -> Result<usize, PolicyError>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
