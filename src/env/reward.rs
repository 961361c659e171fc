//! Step outcomes and the reward attached to each of them.

use super::config::RewardConfig;

/// What happened while resolving one environment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An arriving agent was placed on `node`.
    Deployed { node: usize },
    /// The chosen node was down or full; nothing changed.
    DeployFailed { node: usize },
    /// The arriving agent was rejected.
    Rejected,
    /// An agent left `node`.
    Departed { node: usize },
    /// `node` failed, dropping `lost` agents.
    NodeFailed { node: usize, lost: u32 },
    /// `node` came back up.
    NodeRecovered { node: usize },
    /// Nothing happened (no event, or an event with nothing to act on).
    Idle,
}

/// Computes rewards for the deployment environment.
pub struct RewardComputer;

impl RewardComputer {
    /// Returns the reward for a single step outcome.
    ///
    /// | outcome          | reward                          |
    /// |------------------|---------------------------------|
    /// | `Deployed`       | `deploy_success`                |
    /// | `DeployFailed`   | `deploy_failure`                |
    /// | `Rejected`       | `reject`                        |
    /// | `NodeFailed`     | `-lost_agent_penalty × lost`    |
    /// | `NodeRecovered`  | `recovery`                      |
    /// | otherwise        | `0`                             |
    pub fn compute(outcome: &StepOutcome, config: &RewardConfig) -> f64 {
        match outcome {
            StepOutcome::Deployed { .. } => config.deploy_success,
            StepOutcome::DeployFailed { .. } => config.deploy_failure,
            StepOutcome::Rejected => config.reject,
            StepOutcome::NodeFailed { lost, .. } => -config.lost_agent_penalty * *lost as f64,
            StepOutcome::NodeRecovered { .. } => config.recovery,
            StepOutcome::Departed { .. } | StepOutcome::Idle => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrival_rewards() {
        let cfg = RewardConfig::default();
        assert_eq!(RewardComputer::compute(&StepOutcome::Deployed { node: 0 }, &cfg), 1.0);
        assert_eq!(
            RewardComputer::compute(&StepOutcome::DeployFailed { node: 0 }, &cfg),
            -1.0
        );
        assert_eq!(RewardComputer::compute(&StepOutcome::Rejected, &cfg), -0.5);
    }

    #[test]
    fn failure_penalty_scales_with_lost_agents() {
        let cfg = RewardConfig::default();
        let outcome = StepOutcome::NodeFailed { node: 1, lost: 3 };
        assert_eq!(RewardComputer::compute(&outcome, &cfg), -6.0);
        let empty = StepOutcome::NodeFailed { node: 1, lost: 0 };
        assert_eq!(RewardComputer::compute(&empty, &cfg), 0.0);
    }

    #[test]
    fn neutral_outcomes() {
        let cfg = RewardConfig::default();
        assert_eq!(RewardComputer::compute(&StepOutcome::Departed { node: 2 }, &cfg), 0.0);
        assert_eq!(RewardComputer::compute(&StepOutcome::Idle, &cfg), 0.0);
        assert_eq!(
            RewardComputer::compute(&StepOutcome::NodeRecovered { node: 0 }, &cfg),
            0.5
        );
    }
}
