//! Generalized Advantage Estimation (GAE-λ).
//!
//! Computes advantages and returns from rollout data in one backward pass.
//! The value after the last stored transition is always bootstrapped as 0.

/// Advantages and discounted returns for a rollout, aligned with its steps.
#[derive(Debug, Clone, PartialEq)]
pub struct GaeEstimate {
    pub advantages: Vec<f64>,
    /// `advantages[t] + values[t]`.
    pub returns: Vec<f64>,
}

/// Computes GAE-λ advantages and discounted returns.
///
/// # Arguments
///
/// * `rewards` - Per-step rewards
/// * `values` - Per-step value estimates from the critic
/// * `dones` - Per-step episode termination flags
/// * `gamma` - Discount factor
/// * `gae_lambda` - GAE λ parameter (0 = TD(0), 1 = Monte Carlo)
pub fn compute_gae(
    rewards: &[f64],
    values: &[f64],
    dones: &[bool],
    gamma: f64,
    gae_lambda: f64,
) -> GaeEstimate {
    let n = rewards.len();
    assert_eq!(values.len(), n);
    assert_eq!(dones.len(), n);

    let mut advantages = vec![0.0; n];
    let mut gae = 0.0;

    for t in (0..n).rev() {
        let next_value = if t + 1 < n { values[t + 1] } else { 0.0 };
        let next_non_terminal = if dones[t] { 0.0 } else { 1.0 };

        let delta = rewards[t] + gamma * next_value * next_non_terminal - values[t];
        gae = delta + gamma * gae_lambda * next_non_terminal * gae;
        advantages[t] = gae;
    }

    let returns: Vec<f64> = advantages
        .iter()
        .zip(values.iter())
        .map(|(a, v)| a + v)
        .collect();

    GaeEstimate {
        advantages,
        returns,
    }
}

/// Normalizes advantages to zero mean and unit sample standard deviation.
///
/// `1e-8` is added to the deviation; with fewer than two values the
/// deviation is taken as 0.
pub fn normalize_advantages(advantages: &[f64]) -> Vec<f64> {
    let n = advantages.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = advantages.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    advantages.iter().map(|a| (a - mean) / (std + 1e-8)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gae_basic() {
        let rewards = vec![1.0, 1.0, 1.0];
        let values = vec![0.5, 0.5, 0.5];
        let dones = vec![false, false, true];
        let est = compute_gae(&rewards, &values, &dones, 0.99, 0.95);

        assert_eq!(est.advantages.len(), 3);
        assert_eq!(est.returns.len(), 3);

        // Last step (done=true): delta = 1.0 + 0 - 0.5 = 0.5, gae = 0.5
        assert!((est.advantages[2] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn gae_single_terminal_step() {
        let est = compute_gae(&[3.0], &[1.25], &[true], 0.99, 0.95);
        assert!((est.advantages[0] - 1.75).abs() < 1e-10);
        assert!((est.returns[0] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn gae_two_steps() {
        let (r0, r1, v0, v1, g, l) = (1.0, -0.5, 0.2, 0.7, 0.9, 0.8);
        let est = compute_gae(&[r0, r1], &[v0, v1], &[false, true], g, l);

        let adv1 = r1 - v1;
        let delta0 = r0 + g * v1 - v0;
        let adv0 = delta0 + g * l * adv1;
        assert!((est.advantages[1] - adv1).abs() < 1e-10);
        assert!((est.advantages[0] - adv0).abs() < 1e-10);
        assert!((est.returns[0] - (adv0 + v0)).abs() < 1e-10);
        assert!((est.returns[1] - (adv1 + v1)).abs() < 1e-10);
    }

    #[test]
    fn gae_with_lambda_zero() {
        // λ=0 => TD(0): advantages are just TD errors
        let rewards = vec![1.0, 2.0];
        let values = vec![0.5, 1.0];
        let dones = vec![false, true];
        let est = compute_gae(&rewards, &values, &dones, 0.99, 0.0);

        // t=1 (done=true): delta = 2.0 + 0 - 1.0 = 1.0
        assert!((est.advantages[1] - 1.0).abs() < 1e-10);
        // t=0 (done=false): delta = 1.0 + 0.99*1.0 - 0.5 = 1.49
        assert!((est.advantages[0] - 1.49).abs() < 1e-10);
    }

    #[test]
    fn unfinished_tail_bootstraps_zero() {
        let est = compute_gae(&[1.0], &[0.4], &[false], 0.99, 0.95);
        assert!((est.advantages[0] - 0.6).abs() < 1e-10);
    }

    #[test]
    fn done_cuts_the_recursion() {
        // the second episode must not leak into the first
        let est = compute_gae(&[1.0, 5.0], &[0.0, 0.0], &[true, true], 0.99, 0.95);
        assert!((est.advantages[0] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn normalize_uses_sample_std() {
        let norm = normalize_advantages(&[1.0, 2.0, 3.0]);
        let mean: f64 = norm.iter().sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-10);
        // sample std of [1,2,3] is 1
        assert!((norm[0] + 1.0).abs() < 1e-6);
        assert!((norm[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_constant_and_single() {
        assert!(normalize_advantages(&[2.0, 2.0]).iter().all(|a| a.abs() < 1e-10));
        assert_eq!(normalize_advantages(&[5.0]), vec![0.0]);
        assert!(normalize_advantages(&[]).is_empty());
    }
}
