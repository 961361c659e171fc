//! Service deployment environment.
//!
//! Each step resolves the pending event (using the action only for agent
//! arrivals), computes the reward, then draws the next event:
//! resolve → reward → advance → draw event → observe.

use log::info;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::cluster::Cluster;
use super::config::EnvConfig;
use super::error::EnvError;
use super::event::EventKind;
use super::observation::{Observation, ObservationBuilder};
use super::reward::{RewardComputer, StepOutcome};

/// Cumulative statistics of a finished episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// Sum of rewards over the episode.
    pub reward: f64,
    /// Number of steps in the episode.
    pub length: u32,
}

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation after the step, encoding the *next* event.
    pub observation: Observation,
    /// Reward for resolving the event that was pending before the step.
    pub reward: f64,
    /// Whether the episode reached its horizon.
    pub terminated: bool,
    /// Always false: episodes only end by reaching the horizon.
    pub truncated: bool,
    /// The event that was resolved by this step.
    pub resolved_event: EventKind,
    /// What the resolution did.
    pub outcome: StepOutcome,
    /// Step counter after the step.
    pub time_step: u32,
    /// Set on the step that ends the episode.
    pub episode: Option<EpisodeSummary>,
}

impl StepResult {
    /// True if the episode ended, for either reason.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Discrete-event simulation of agents being deployed onto failing nodes.
///
/// # Lifecycle
///
/// 1. Call [`DeploymentEnv::new`] with a configuration and seed.
/// 2. Call [`DeploymentEnv::reset`] to start an episode. The first
///    observation always reports [`EventKind::NoEvent`]; the first real event
///    is drawn by the first [`DeploymentEnv::step`].
/// 3. Call [`DeploymentEnv::step`] until the result is terminated.
#[derive(Debug)]
pub struct DeploymentEnv {
    config: EnvConfig,
    cluster: Cluster,
    current_event: EventKind,
    steps: u32,
    event_dist: WeightedIndex<f64>,
    rng: StdRng,
    seed: u64,
    episode_index: u64,
    cumulative_reward: f64,
}

impl DeploymentEnv {
    /// Creates a new environment with the given configuration and RNG seed.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] if the configuration is invalid.
    pub fn new(config: EnvConfig, seed: u64) -> Result<Self, EnvError> {
        config.validate()?;
        let event_dist = WeightedIndex::new(config.event_probabilities).map_err(|e| {
            EnvError::InvalidEventProbabilities {
                reason: e.to_string(),
            }
        })?;
        let cluster = Cluster::new(config.num_nodes, config.node_capacity);

        Ok(Self {
            config,
            cluster,
            current_event: EventKind::NoEvent,
            steps: 0,
            event_dist,
            rng: StdRng::seed_from_u64(seed),
            seed,
            episode_index: 0,
            cumulative_reward: 0.0,
        })
    }

    /// Resets to the canonical start state and returns the first observation.
    ///
    /// The RNG is re-seeded from `seed + episode index`, so every episode is
    /// reproducible on its own.
    pub fn reset(&mut self) -> Observation {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.episode_index));
        self.episode_index += 1;

        self.cluster = Cluster::new(self.config.num_nodes, self.config.node_capacity);
        self.current_event = EventKind::NoEvent;
        self.steps = 0;
        self.cumulative_reward = 0.0;

        self.observation()
    }

    /// Executes one environment step.
    ///
    /// # Arguments
    ///
    /// * `action` - Node index in `[0, num_nodes)` to deploy an arriving
    ///   agent to; any value `>= num_nodes` rejects it. Ignored for every
    ///   other event.
    pub fn step(&mut self, action: usize) -> StepResult {
        let resolved_event = self.current_event;

        // 1. Resolve the pending event
        let outcome = match resolved_event {
            EventKind::AgentArrival => {
                if action < self.config.num_nodes {
                    if self.cluster.try_deploy(action) {
                        StepOutcome::Deployed { node: action }
                    } else {
                        StepOutcome::DeployFailed { node: action }
                    }
                } else {
                    StepOutcome::Rejected
                }
            }
            EventKind::AgentDeparture => match self.cluster.depart_random(&mut self.rng) {
                Some(node) => StepOutcome::Departed { node },
                None => StepOutcome::Idle,
            },
            EventKind::NodeFailure => match self.cluster.fail_random(&mut self.rng) {
                Some((node, lost)) => StepOutcome::NodeFailed { node, lost },
                None => StepOutcome::Idle,
            },
            EventKind::NodeRecovery => match self.cluster.recover_random(&mut self.rng) {
                Some(node) => StepOutcome::NodeRecovered { node },
                None => StepOutcome::Idle,
            },
            EventKind::NoEvent => StepOutcome::Idle,
        };
        debug_assert!(self.cluster.check_invariants());

        // 2. Reward
        let reward = RewardComputer::compute(&outcome, &self.config.rewards);
        self.cumulative_reward += reward;

        // 3. Advance time and draw the next event
        self.steps += 1;
        self.current_event = self.draw_event();

        let terminated = self.steps >= self.config.episode_horizon;
        let episode = if self.steps == self.config.episode_horizon {
            let summary = EpisodeSummary {
                reward: self.cumulative_reward,
                length: self.steps,
            };
            info!(
                "episode {} finished: reward={:.2} length={}",
                self.episode_index, summary.reward, summary.length
            );
            Some(summary)
        } else {
            None
        };

        StepResult {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
            resolved_event,
            outcome,
            time_step: self.steps,
            episode,
        }
    }

    /// Overrides the pending event, which the next [`DeploymentEnv::step`] resolves.
    pub fn force_event(&mut self, event: EventKind) {
        self.current_event = event;
    }

    /// Observation of the current state.
    pub fn observation(&self) -> Observation {
        ObservationBuilder::build(self.current_event, &self.cluster, &self.config)
    }

    fn draw_event(&mut self) -> EventKind {
        let index = self.event_dist.sample(&mut self.rng);
        EventKind::from_index(index).unwrap_or(EventKind::NoEvent)
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// The event the next step will resolve.
    pub fn current_event(&self) -> EventKind {
        self.current_event
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Reward accumulated since the last reset.
    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    pub fn observation_dim(&self) -> usize {
        self.config.observation_dim()
    }

    pub fn action_dim(&self) -> usize {
        self.config.action_dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_node_env() -> DeploymentEnv {
        let config = EnvConfig {
            num_nodes: 1,
            node_capacity: 1.0,
            ..EnvConfig::default()
        };
        let mut env = DeploymentEnv::new(config, 42).unwrap();
        env.reset();
        env
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EnvConfig {
            num_nodes: 0,
            ..EnvConfig::default()
        };
        assert_eq!(
            DeploymentEnv::new(config, 0).unwrap_err(),
            EnvError::InvalidNodeCount
        );
    }

    #[test]
    fn reset_returns_canonical_observation() {
        let mut env = DeploymentEnv::new(EnvConfig::default(), 7).unwrap();
        let obs = env.reset();
        assert_eq!(obs.len(), env.observation_dim());
        assert_eq!(obs.event(), Some(EventKind::NoEvent));
        assert_eq!(env.steps(), 0);
        assert_eq!(env.cluster().num_agents(), 0);
        assert_eq!(env.cluster().status(), vec![1, 1, 1]);
        // node flags 1, occupancy 0, agents 0
        assert_eq!(&obs.as_slice()[5..], &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn arrival_on_empty_node_deploys() {
        let mut env = single_node_env();
        env.force_event(EventKind::AgentArrival);
        let result = env.step(0);
        assert_eq!(result.reward, 1.0);
        assert_eq!(result.outcome, StepOutcome::Deployed { node: 0 });
        assert_eq!(env.cluster().occupancy(), &[1]);
        assert_eq!(env.cluster().num_agents(), 1);
    }

    #[test]
    fn arrival_on_full_node_fails() {
        let mut env = single_node_env();
        env.force_event(EventKind::AgentArrival);
        env.step(0);

        env.force_event(EventKind::AgentArrival);
        let before = env.cluster().clone();
        let result = env.step(0);
        assert_eq!(result.reward, -1.0);
        assert_eq!(result.outcome, StepOutcome::DeployFailed { node: 0 });
        assert_eq!(env.cluster(), &before);
    }

    #[test]
    fn reject_costs_half() {
        let mut env = single_node_env();
        env.force_event(EventKind::AgentArrival);
        let result = env.step(1);
        assert_eq!(result.reward, -0.5);
        assert_eq!(result.outcome, StepOutcome::Rejected);
        assert_eq!(env.cluster().num_agents(), 0);
    }

    #[test]
    fn failure_of_loaded_node_costs_two_per_agent() {
        let config = EnvConfig {
            num_nodes: 1,
            node_capacity: 5.0,
            ..EnvConfig::default()
        };
        let mut env = DeploymentEnv::new(config, 3).unwrap();
        env.reset();
        for _ in 0..3 {
            env.force_event(EventKind::AgentArrival);
            env.step(0);
        }

        env.force_event(EventKind::NodeFailure);
        let result = env.step(0);
        assert_eq!(result.reward, -6.0);
        assert_eq!(env.cluster().status(), vec![0]);
        assert_eq!(env.cluster().occupancy(), &[0]);
        assert_eq!(env.cluster().num_agents(), 0);
    }

    #[test]
    fn benign_noops() {
        let mut env = single_node_env();

        env.force_event(EventKind::AgentDeparture);
        let result = env.step(0);
        assert_eq!(result.reward, 0.0);
        assert_eq!(result.outcome, StepOutcome::Idle);

        env.force_event(EventKind::NodeRecovery);
        let result = env.step(0);
        assert_eq!(result.reward, 0.0);
        assert_eq!(result.outcome, StepOutcome::Idle);

        env.force_event(EventKind::NodeFailure);
        env.step(0);
        env.force_event(EventKind::NodeFailure);
        let result = env.step(0);
        assert_eq!(result.outcome, StepOutcome::Idle);
        assert_eq!(result.reward, 0.0);
    }

    #[test]
    fn recovery_rewards_half() {
        let mut env = single_node_env();
        env.force_event(EventKind::NodeFailure);
        env.step(0);
        env.force_event(EventKind::NodeRecovery);
        let result = env.step(0);
        assert_eq!(result.reward, 0.5);
        assert_eq!(env.cluster().status(), vec![1]);
    }

    #[test]
    fn episode_terminates_at_horizon() {
        let config = EnvConfig {
            episode_horizon: 5,
            ..EnvConfig::default()
        };
        let mut env = DeploymentEnv::new(config, 11).unwrap();
        env.reset();
        let mut total = 0.0;
        for t in 0..5 {
            let result = env.step(3);
            total += result.reward;
            assert!(!result.truncated);
            if t < 4 {
                assert!(!result.terminated);
                assert!(result.episode.is_none());
            } else {
                assert!(result.terminated);
                let summary = result.episode.unwrap();
                assert_eq!(summary.length, 5);
                assert!((summary.reward - total).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn invariants_hold_over_random_episode() {
        let mut env = DeploymentEnv::new(EnvConfig::default(), 99).unwrap();
        env.reset();
        for t in 0..100 {
            env.step(t % 4);
            let cluster = env.cluster();
            assert!(cluster.check_invariants());
            assert_eq!(
                cluster.num_agents(),
                cluster.occupancy().iter().sum::<u32>()
            );
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = |seed| {
            let mut env = DeploymentEnv::new(EnvConfig::default(), seed).unwrap();
            env.reset();
            (0..100)
                .map(|t| {
                    let r = env.step(t % 4);
                    (r.observation, r.reward)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }
}
