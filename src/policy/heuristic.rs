//! Least-loaded heuristic policy.
//!
//! Deploys each arriving agent to the active node with the lowest relative
//! occupancy, and rejects it when no active node has room.

use super::error::PolicyError;
use super::trait_::Policy;
use crate::env::{EventKind, Observation, ObservationBuilder};

/// Baseline that balances load across active nodes.
///
/// Everything is decoded from the observation:
/// ```text
/// [event_one_hot(5)] ++ [node_active(N)] ++ [occupancy / capacity (N)] ++ [agents]
/// ```
/// A node counts as having room while its normalised occupancy is below 1.
/// For events other than an arrival the action is ignored by the
/// environment, so the policy returns reject.
pub struct LeastLoadedPolicy {
    num_nodes: usize,
}

impl LeastLoadedPolicy {
    /// Creates a new heuristic for a cluster with `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self { num_nodes }
    }

    fn reject(&self) -> usize {
        self.num_nodes
    }
}

impl Policy for LeastLoadedPolicy {
    fn select_action(&mut self, observation: &Observation) -> Result<usize, PolicyError> {
        let expected = EventKind::COUNT + 2 * self.num_nodes + 1;
        if observation.len() != expected {
            return Err(PolicyError::ObservationDim {
                expected,
                found: observation.len(),
            });
        }
        if observation.event() != Some(EventKind::AgentArrival) {
            return Ok(self.reject());
        }

        let status = ObservationBuilder::node_status(observation, self.num_nodes);
        let occupancy = ObservationBuilder::node_occupancy(observation, self.num_nodes);

        let best = status
            .iter()
            .zip(occupancy)
            .enumerate()
            .filter(|(_, (&active, &occ))| active > 0.5 && occ < 1.0)
            .min_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
            .map(|(node, _)| node);

        Ok(best.unwrap_or_else(|| self.reject()))
    }

    fn name(&self) -> &str {
        "least_loaded"
    }
}
