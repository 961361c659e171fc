use thiserror::Error;

/// Errors raised while running a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Tensor backend error: {0}")]
    Backend(#[from] candle_core::Error),

    #[error("Observation has {found} features, policy expects {expected}")]
    ObservationDim { expected: usize, found: usize },

    #[error("Action distribution is invalid: {0}")]
    InvalidDistribution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_dim_display() {
        let e = PolicyError::ObservationDim {
            expected: 12,
            found: 3,
        };
        assert_eq!(e.to_string(), "Observation has 3 features, policy expects 12");
    }
}
