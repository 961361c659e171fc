//! Loss statistics reported by a policy update.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean losses over every minibatch step of one update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateStats {
    pub policy_loss: f64,
    pub value_loss: f64,
    /// Mean entropy of the action distribution (not the entropy loss).
    pub entropy: f64,
    /// Number of minibatch steps averaged.
    pub minibatches: usize,
}

/// Running sums scoped to a single update.
#[derive(Debug, Default)]
pub struct LossAccumulator {
    policy_loss: f64,
    value_loss: f64,
    entropy: f64,
    count: usize,
}

impl LossAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one minibatch step.
    pub fn add(&mut self, policy_loss: f64, value_loss: f64, entropy: f64) {
        self.policy_loss += policy_loss;
        self.value_loss += value_loss;
        self.entropy += entropy;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Averages the recorded steps. All zeros when nothing was recorded.
    pub fn finish(self) -> UpdateStats {
        if self.count == 0 {
            return UpdateStats::default();
        }
        let n = self.count as f64;
        UpdateStats {
            policy_loss: self.policy_loss / n,
            value_loss: self.value_loss / n,
            entropy: self.entropy / n,
            minibatches: self.count,
        }
    }
}
