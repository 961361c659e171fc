//! Evaluation metrics for the deployment environment.
//!
//! Runs a policy for a number of full episodes and aggregates episode
//! rewards, lengths, and per-outcome counts.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::env::{DeploymentEnv, StepOutcome};
use crate::policy::{Policy, PolicyError};

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluationMetrics {
    /// Mean cumulative reward per episode.
    pub mean_reward: f64,
    /// Population standard deviation of episode rewards.
    pub std_reward: f64,
    pub min_reward: f64,
    pub max_reward: f64,
    /// Mean episode length in steps.
    pub mean_length: f64,
    /// Mean successful deployments per episode.
    pub mean_deployed: f64,
    /// Mean deployments onto a down or full node per episode.
    pub mean_failed_deploys: f64,
    /// Mean rejected arrivals per episode.
    pub mean_rejected: f64,
    /// Mean agents lost to node failures per episode.
    pub mean_lost_agents: f64,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

/// Tracks per-episode statistics during evaluation.
#[derive(Debug, Default)]
struct EpisodeStats {
    reward: f64,
    length: u32,
    deployed: u32,
    failed_deploys: u32,
    rejected: u32,
    lost_agents: u32,
}

impl EpisodeStats {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Deployed { .. } => self.deployed += 1,
            StepOutcome::DeployFailed { .. } => self.failed_deploys += 1,
            StepOutcome::Rejected => self.rejected += 1,
            StepOutcome::NodeFailed { lost, .. } => self.lost_agents += lost,
            _ => {}
        }
    }
}

impl EvaluationMetrics {
    /// Evaluates a policy over multiple episodes and returns aggregated metrics.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to evaluate in; reset before every episode
    /// * `policy` - The policy to evaluate
    /// * `n_episodes` - Number of episodes to run
    pub fn evaluate(
        env: &mut DeploymentEnv,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, PolicyError> {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            let mut obs = env.reset();
            let mut stats = EpisodeStats::default();

            loop {
                let action = policy.select_action(&obs)?;
                let result = env.step(action);

                stats.reward += result.reward;
                stats.length += 1;
                stats.record(&result.outcome);
                obs = result.observation;

                if result.terminated || result.truncated {
                    break;
                }
            }

            all_stats.push(stats);
        }

        Ok(Self::aggregate(&all_stats))
    }

    fn aggregate(all_stats: &[EpisodeStats]) -> Self {
        if all_stats.is_empty() {
            return Self::default();
        }
        let mean_reward = mean_of(all_stats, |s| s.reward);
        let std_reward = mean_of(all_stats, |s| (s.reward - mean_reward).powi(2)).sqrt();
        let min_reward = all_stats.iter().map(|s| s.reward).fold(f64::INFINITY, f64::min);
        let max_reward = all_stats
            .iter()
            .map(|s| s.reward)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            mean_reward,
            std_reward,
            min_reward,
            max_reward,
            mean_length: mean_of(all_stats, |s| s.length as f64),
            mean_deployed: mean_of(all_stats, |s| s.deployed as f64),
            mean_failed_deploys: mean_of(all_stats, |s| s.failed_deploys as f64),
            mean_rejected: mean_of(all_stats, |s| s.rejected as f64),
            mean_lost_agents: mean_of(all_stats, |s| s.lost_agents as f64),
            n_episodes: all_stats.len(),
        }
    }
}

fn mean_of(stats: &[EpisodeStats], f: impl Fn(&EpisodeStats) -> f64) -> f64 {
    stats.iter().map(f).sum::<f64>() / stats.len() as f64
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(
            f,
            "  Mean reward:          {:.2} ± {:.2}",
            self.mean_reward, self.std_reward
        )?;
        writeln!(
            f,
            "  Min / max reward:     {:.2} / {:.2}",
            self.min_reward, self.max_reward
        )?;
        writeln!(f, "  Mean episode length:  {:.1}", self.mean_length)?;
        writeln!(f, "  Mean deployed:        {:.1}", self.mean_deployed)?;
        writeln!(f, "  Mean failed deploys:  {:.1}", self.mean_failed_deploys)?;
        writeln!(f, "  Mean rejected:        {:.1}", self.mean_rejected)?;
        write!(f, "  Mean lost agents:     {:.1}", self.mean_lost_agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvConfig;
    use crate::policy::{LeastLoadedPolicy, RandomPolicy};

    fn env(horizon: u32) -> DeploymentEnv {
        let config = EnvConfig {
            episode_horizon: horizon,
            ..EnvConfig::default()
        };
        DeploymentEnv::new(config, 42).unwrap()
    }

    #[test]
    fn evaluate_completes() {
        let mut env = env(10);
        let mut policy = RandomPolicy::new(env.action_dim(), 0);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 3).unwrap();
        assert_eq!(metrics.n_episodes, 3);
        assert!((metrics.mean_length - 10.0).abs() < 1e-10);
        assert!(metrics.min_reward <= metrics.mean_reward);
        assert!(metrics.mean_reward <= metrics.max_reward);
        assert!(metrics.std_reward >= 0.0);
    }

    #[test]
    fn heuristic_never_fails_a_deploy() {
        let mut env = env(50);
        let mut policy = LeastLoadedPolicy::new(env.config().num_nodes);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 5).unwrap();
        assert_eq!(metrics.mean_failed_deploys, 0.0);
    }

    #[test]
    fn aggregate_statistics() {
        let stats = [
            EpisodeStats {
                reward: 1.0,
                length: 4,
                ..EpisodeStats::default()
            },
            EpisodeStats {
                reward: 3.0,
                length: 6,
                rejected: 2,
                ..EpisodeStats::default()
            },
        ];
        let m = EvaluationMetrics::aggregate(&stats);
        assert!((m.mean_reward - 2.0).abs() < 1e-10);
        assert!((m.std_reward - 1.0).abs() < 1e-10);
        assert_eq!(m.min_reward, 1.0);
        assert_eq!(m.max_reward, 3.0);
        assert!((m.mean_length - 5.0).abs() < 1e-10);
        assert!((m.mean_rejected - 1.0).abs() < 1e-10);
    }

    #[test]
    fn zero_episodes_is_empty() {
        let mut env = env(10);
        let mut policy = RandomPolicy::new(env.action_dim(), 0);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 0).unwrap();
        assert_eq!(metrics, EvaluationMetrics::default());
        assert!(metrics.to_string().contains("0 episodes"));
    }
}
