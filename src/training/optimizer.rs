//! Adam optimizer over candle [`Var`]s, with checkpointable state.

use candle_core::backprop::GradStore;
use candle_core::{bail, Result, Tensor, Var};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            lr: 3e-4,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

/// Adam with bias-corrected first and second moments.
///
/// Moments and the step count are plain state so a checkpoint can restore
/// them exactly.
pub struct Adam {
    vars: Vec<(String, Var)>,
    m: Vec<Tensor>,
    v: Vec<Tensor>,
    step: u64,
    config: AdamConfig,
}

impl Adam {
    /// Creates an optimizer with zeroed moments for the given named parameters.
    pub fn new(vars: Vec<(String, Var)>, config: AdamConfig) -> Result<Self> {
        let m = vars
            .iter()
            .map(|(_, var)| var.as_tensor().zeros_like())
            .collect::<Result<Vec<_>>>()?;
        let v = m.clone();
        Ok(Self {
            vars,
            m,
            v,
            step: 0,
            config,
        })
    }

    /// Applies one update from `grads`. Parameters without a gradient are skipped.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        let AdamConfig {
            lr,
            beta1,
            beta2,
            eps,
        } = self.config;
        self.step += 1;
        let t = self.step as i32;
        let bias1 = 1.0 - beta1.powi(t);
        let bias2 = 1.0 - beta2.powi(t);

        for (i, (_, var)) in self.vars.iter().enumerate() {
            let Some(g) = grads.get(var.as_tensor()) else {
                continue;
            };
            let m = self.m[i].affine(beta1, 0.0)?.add(&g.affine(1.0 - beta1, 0.0)?)?;
            let v = self.v[i]
                .affine(beta2, 0.0)?
                .add(&g.sqr()?.affine(1.0 - beta2, 0.0)?)?;

            let m_hat = m.affine(1.0 / bias1, 0.0)?;
            let v_hat = v.affine(1.0 / bias2, 0.0)?;
            let delta = m_hat.div(&v_hat.sqrt()?.affine(1.0, eps)?)?.affine(lr, 0.0)?;
            var.set(&var.as_tensor().sub(&delta)?)?;

            self.m[i] = m;
            self.v[i] = v;
        }
        Ok(())
    }

    /// Number of updates applied so far.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.lr
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.config.lr = lr;
    }

    /// `(name, first moment, second moment)` per parameter, in parameter order.
    pub fn moments(&self) -> impl Iterator<Item = (&str, &Tensor, &Tensor)> {
        self.vars
            .iter()
            .zip(self.m.iter().zip(self.v.iter()))
            .map(|((name, _), (m, v))| (name.as_str(), m, v))
    }

    /// Replaces the whole optimizer state.
    ///
    /// `m` and `v` must hold one tensor per parameter, in parameter order,
    /// each shaped like its parameter.
    pub fn set_state(&mut self, step: u64, m: Vec<Tensor>, v: Vec<Tensor>) -> Result<()> {
        if m.len() != self.vars.len() || v.len() != self.vars.len() {
            bail!(
                "optimizer state has {}/{} moments, expected {}",
                m.len(),
                v.len(),
                self.vars.len()
            );
        }
        for ((name, var), (mi, vi)) in self.vars.iter().zip(m.iter().zip(v.iter())) {
            if mi.dims() != var.dims() || vi.dims() != var.dims() {
                bail!("optimizer moment shape mismatch for {}", name);
            }
        }
        self.step = step;
        self.m = m;
        self.v = v;
        Ok(())
    }
}

/// Rescales all gradients in place when their global L2 norm exceeds `max_norm`.
///
/// Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f64> {
    let mut total = 0.0f64;
    for var in vars {
        if let Some(g) = grads.get(var.as_tensor()) {
            total += g.sqr()?.sum_all()?.to_scalar::<f32>()? as f64;
        }
    }
    let norm = total.sqrt();

    if norm > max_norm {
        let scale = max_norm / (norm + 1e-6);
        for var in vars {
            if let Some(g) = grads.get(var.as_tensor()) {
                let clipped = g.affine(scale, 0.0)?;
                grads.insert(var.as_tensor(), clipped);
            }
        }
    }
    Ok(norm)
}
