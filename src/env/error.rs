use thiserror::Error;

/// Invalid environment configuration, detected when the environment is built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("Number of nodes must be positive")]
    InvalidNodeCount,

    #[error("Node capacity must be a positive finite number, got {0}")]
    InvalidCapacity(f64),

    #[error("Maximum agent count must be positive")]
    InvalidMaxAgents,

    #[error("Episode horizon must be positive")]
    InvalidHorizon,

    #[error("Invalid event probabilities: {reason}")]
    InvalidEventProbabilities { reason: String },
}
