//! Configuration for the deployment environment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::EnvError;
use super::event::EventKind;

/// Tolerance on the sum of the event probability vector.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Reward assigned to each step outcome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RewardConfig {
    /// Reward for placing an arriving agent on a node with room.
    pub deploy_success: f64,
    /// Reward for targeting a failed or full node.
    pub deploy_failure: f64,
    /// Reward for rejecting an arriving agent.
    pub reject: f64,
    /// Penalty per agent lost when its node fails (reward = -penalty × lost).
    pub lost_agent_penalty: f64,
    /// Reward when a failed node comes back.
    pub recovery: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            deploy_success: 1.0,
            deploy_failure: -1.0,
            reject: -0.5,
            lost_agent_penalty: 2.0,
            recovery: 0.5,
        }
    }
}

/// Configuration for the deployment environment.
///
/// Controls cluster size, per-node capacity, event dynamics, episode length
/// and reward values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvConfig {
    // --- Cluster ---
    /// Number of compute nodes.
    pub num_nodes: usize,
    /// Number of services. Informational only; unused by the dynamics.
    pub num_services: usize,
    /// Agent count used to normalise the agent feature of the observation.
    pub max_agents: usize,
    /// Capacity assigned to every node at reset.
    pub node_capacity: f64,

    // --- Dynamics ---
    /// Probabilities of `[arrival, departure, failure, recovery, no_event]`.
    pub event_probabilities: [f64; EventKind::COUNT],
    /// Number of steps after which an episode terminates.
    pub episode_horizon: u32,

    // --- Reward ---
    pub rewards: RewardConfig,
}

impl EnvConfig {
    /// Checks that the configuration describes a runnable environment.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.num_nodes == 0 {
            return Err(EnvError::InvalidNodeCount);
        }
        if !(self.node_capacity.is_finite() && self.node_capacity > 0.0) {
            return Err(EnvError::InvalidCapacity(self.node_capacity));
        }
        if self.max_agents == 0 {
            return Err(EnvError::InvalidMaxAgents);
        }
        if self.episode_horizon == 0 {
            return Err(EnvError::InvalidHorizon);
        }

        if let Some(p) = self
            .event_probabilities
            .iter()
            .find(|p| !(p.is_finite() && **p >= 0.0))
        {
            return Err(EnvError::InvalidEventProbabilities {
                reason: format!("entry {} is not a non-negative number", p),
            });
        }
        let sum: f64 = self.event_probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(EnvError::InvalidEventProbabilities {
                reason: format!("probabilities sum to {}, expected 1", sum),
            });
        }

        Ok(())
    }

    /// Observation length: event one-hot + node status + node occupancy + agent count.
    pub fn observation_dim(&self) -> usize {
        EventKind::COUNT + 2 * self.num_nodes + 1
    }

    /// Number of actions: one per node, plus reject.
    pub fn action_dim(&self) -> usize {
        self.num_nodes + 1
    }

    /// Index of the reject action.
    pub fn reject_action(&self) -> usize {
        self.num_nodes
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            num_nodes: 3,
            num_services: 5,
            max_agents: 10,
            node_capacity: 5.0,
            event_probabilities: [0.3, 0.2, 0.1, 0.1, 0.3],
            episode_horizon: 100,
            rewards: RewardConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EnvConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.action_dim(), cfg.num_nodes + 1);
        assert_eq!(cfg.reject_action(), 3);
    }

    #[test]
    fn observation_dim_matches() {
        let cfg = EnvConfig::default();
        assert_eq!(cfg.observation_dim(), 5 + 2 * 3 + 1);
    }

    #[test]
    fn zero_nodes_rejected() {
        let cfg = EnvConfig {
            num_nodes: 0,
            ..EnvConfig::default()
        };
        assert_eq!(cfg.validate(), Err(EnvError::InvalidNodeCount));
    }

    #[test]
    fn non_positive_capacity_rejected() {
        for capacity in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let cfg = EnvConfig {
                node_capacity: capacity,
                ..EnvConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(EnvError::InvalidCapacity(_))));
        }
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        let cfg = EnvConfig {
            event_probabilities: [0.3, 0.2, 0.1, 0.1, 0.1],
            ..EnvConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(EnvError::InvalidEventProbabilities { .. })
        ));
    }

    #[test]
    fn negative_probability_rejected() {
        let cfg = EnvConfig {
            event_probabilities: [1.2, -0.2, 0.0, 0.0, 0.0],
            ..EnvConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(EnvError::InvalidEventProbabilities { .. })
        ));
    }

    #[test]
    fn degenerate_but_valid_distribution_accepted() {
        let cfg = EnvConfig {
            event_probabilities: [1.0, 0.0, 0.0, 0.0, 0.0],
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let cfg = EnvConfig {
            num_nodes: 7,
            ..EnvConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let restored: EnvConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cfg);
    }
}
