use thiserror::Error;

use crate::env::EnvError;
use crate::policy::PolicyError;

/// Errors raised while collecting rollouts, updating, or checkpointing.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Tensor backend error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot update from an empty rollout buffer")]
    EmptyRollout,

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("Checkpoint is missing tensor '{0}'")]
    MissingTensor(String),

    #[error("Checkpoint tensor '{name}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_display() {
        let e = TrainingError::ShapeMismatch {
            name: "policy.actor.weight".into(),
            expected: vec![4, 64],
            found: vec![5, 64],
        };
        assert_eq!(
            e.to_string(),
            "Checkpoint tensor 'policy.actor.weight' has shape [5, 64], expected [4, 64]"
        );
    }

    #[test]
    fn empty_rollout_display() {
        assert_eq!(
            TrainingError::EmptyRollout.to_string(),
            "Cannot update from an empty rollout buffer"
        );
    }
}
