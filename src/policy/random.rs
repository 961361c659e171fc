//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::PolicyError;
use super::trait_::Policy;
use crate::env::Observation;

/// Uniformly random action selection over `[0, action_dim)`.
///
/// Used for sanity checks and as a lower-bound baseline.
pub struct RandomPolicy {
    action_dim: usize,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new random policy.
    ///
    /// # Arguments
    ///
    /// * `action_dim` - Number of possible actions (nodes + 1 for reject).
    /// * `seed` - Seed of the policy's own RNG.
    pub fn new(action_dim: usize, seed: u64) -> Self {
        Self {
            action_dim,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _observation: &Observation) -> Result<usize, PolicyError> {
        Ok(self.rng.gen_range(0..self.action_dim))
    }

    fn name(&self) -> &str {
        "random"
    }
}
