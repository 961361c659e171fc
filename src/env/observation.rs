//! Observation encoding for the deployment environment.

use super::cluster::Cluster;
use super::config::EnvConfig;
use super::event::EventKind;

/// Immutable observation vector handed to the policy.
///
/// Layout:
/// ```text
/// [event_one_hot(5)] ++ [node_active(N)] ++ [occupancy / capacity (N)] ++ [agents / max_agents]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    features: Vec<f32>,
}

impl Observation {
    /// Wraps a raw feature vector.
    pub fn from_features(features: Vec<f32>) -> Self {
        Self { features }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Decodes the event from the one-hot block, if present.
    pub fn event(&self) -> Option<EventKind> {
        self.features
            .iter()
            .take(EventKind::COUNT)
            .position(|&x| x > 0.5)
            .and_then(EventKind::from_index)
    }
}

/// Builds observation vectors from environment state.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Encodes the current event and cluster state.
    ///
    /// Occupancy is normalised per node by its capacity; the agent count is
    /// normalised by `max_agents` and clamped to 1.
    pub fn build(event: EventKind, cluster: &Cluster, config: &EnvConfig) -> Observation {
        let n = cluster.num_nodes();
        let mut features = Vec::with_capacity(EventKind::COUNT + 2 * n + 1);

        features.extend(event.one_hot());
        features.extend((0..n).map(|i| if cluster.is_active(i) { 1.0 } else { 0.0 }));
        features.extend(
            cluster
                .occupancy()
                .iter()
                .zip(cluster.capacity())
                .map(|(&occ, &cap)| (occ as f64 / cap) as f32),
        );
        let agents = cluster.num_agents() as f64 / config.max_agents as f64;
        features.push(agents.min(1.0) as f32);

        Observation { features }
    }

    /// Slice of per-node active flags within an observation.
    pub fn node_status(obs: &Observation, num_nodes: usize) -> &[f32] {
        &obs.as_slice()[EventKind::COUNT..EventKind::COUNT + num_nodes]
    }

    /// Slice of per-node normalised occupancy within an observation.
    pub fn node_occupancy(obs: &Observation, num_nodes: usize) -> &[f32] {
        let start = EventKind::COUNT + num_nodes;
        &obs.as_slice()[start..start + num_nodes]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_has_correct_dim() {
        let config = EnvConfig::default();
        let cluster = Cluster::new(config.num_nodes, config.node_capacity);
        let obs = ObservationBuilder::build(EventKind::NoEvent, &cluster, &config);
        assert_eq!(obs.len(), config.observation_dim());
        assert_eq!(obs.event(), Some(EventKind::NoEvent));
    }

    #[test]
    fn occupancy_is_normalised() {
        let config = EnvConfig {
            num_nodes: 2,
            node_capacity: 4.0,
            ..EnvConfig::default()
        };
        let mut cluster = Cluster::new(2, 4.0);
        cluster.try_deploy(1);
        cluster.try_deploy(1);
        let obs = ObservationBuilder::build(EventKind::AgentArrival, &cluster, &config);

        assert_eq!(ObservationBuilder::node_status(&obs, 2), &[1.0, 1.0]);
        assert_eq!(ObservationBuilder::node_occupancy(&obs, 2), &[0.0, 0.5]);
        assert!((obs.as_slice()[obs.len() - 1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn agent_feature_clamped_to_one() {
        let config = EnvConfig {
            num_nodes: 1,
            max_agents: 2,
            node_capacity: 5.0,
            ..EnvConfig::default()
        };
        let mut cluster = Cluster::new(1, 5.0);
        for _ in 0..4 {
            cluster.try_deploy(0);
        }
        let obs = ObservationBuilder::build(EventKind::NoEvent, &cluster, &config);
        assert_eq!(obs.as_slice()[obs.len() - 1], 1.0);
        assert!(obs.as_slice().iter().all(|&x| (0.0..=1.0).contains(&x)));
    }
}
