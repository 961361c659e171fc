//! Rollout buffer for storing transitions between policy updates.

use super::gae::{compute_gae, GaeEstimate};
use crate::env::Observation;

/// Struct-of-arrays view of a rollout, in insertion order.
///
/// `states` is row-major with `obs_dim` features per transition.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutBatch {
    pub states: Vec<f32>,
    pub obs_dim: usize,
    pub actions: Vec<u32>,
    pub rewards: Vec<f64>,
    pub log_probs: Vec<f64>,
    pub values: Vec<f64>,
    pub dones: Vec<bool>,
}

impl RolloutBatch {
    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Rollout buffer that stores transitions for PPO updates.
///
/// Accumulates transitions across episode boundaries, then provides them for
/// advantage computation and policy updates. Cleared after every update.
#[derive(Debug, Default)]
pub struct RolloutBuffer {
    states: Vec<Observation>,
    actions: Vec<usize>,
    rewards: Vec<f64>,
    log_probs: Vec<f64>,
    values: Vec<f64>,
    dones: Vec<bool>,
}

impl RolloutBuffer {
    /// Creates a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one transition.
    ///
    /// # Arguments
    ///
    /// * `state` - Observation the action was chosen from
    /// * `action` - Action taken
    /// * `reward` - Reward returned by the step
    /// * `log_prob` - Log-probability of `action` at collection time
    /// * `value` - Critic estimate at collection time
    /// * `done` - Whether the step ended the episode
    pub fn add(
        &mut self,
        state: Observation,
        action: usize,
        reward: f64,
        log_prob: f64,
        value: f64,
        done: bool,
    ) {
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
        self.log_probs.push(log_prob);
        self.values.push(value);
        self.dones.push(done);
    }

    /// Clears all stored data.
    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.log_probs.clear();
        self.values.clear();
        self.dones.clear();
    }

    /// Returns the number of stored transitions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Materializes the stored transitions as a [`RolloutBatch`].
    pub fn get(&self) -> RolloutBatch {
        let obs_dim = self.states.first().map_or(0, Observation::len);
        RolloutBatch {
            states: self
                .states
                .iter()
                .flat_map(|s| s.as_slice().iter().copied())
                .collect(),
            obs_dim,
            actions: self.actions.iter().map(|&a| a as u32).collect(),
            rewards: self.rewards.clone(),
            log_probs: self.log_probs.clone(),
            values: self.values.clone(),
            dones: self.dones.clone(),
        }
    }

    /// Runs GAE over the stored rewards, values and done flags.
    pub fn compute_returns_and_advantages(&self, gamma: f64, gae_lambda: f64) -> GaeEstimate {
        compute_gae(&self.rewards, &self.values, &self.dones, gamma, gae_lambda)
    }
}
