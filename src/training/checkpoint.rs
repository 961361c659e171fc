//! Single-file checkpoint of policy parameters and optimizer state.
//!
//! Tensors are stored in one safetensors file:
//! - `policy.<param>`: network parameters
//! - `adam.m.<param>`, `adam.v.<param>`: Adam moments
//! - `adam.step`: Adam step count

use std::collections::HashMap;
use std::path::Path;

use candle_core::{safetensors, DType, Device, Tensor};
use log::info;

use super::error::TrainingError;
use super::optimizer::Adam;
use crate::policy::ActorCritic;

const STEP_KEY: &str = "adam.step";

/// Writes the checkpoint to a temporary file, then renames it over `path`.
pub fn save(path: &Path, policy: &ActorCritic, optimizer: &Adam) -> Result<(), TrainingError> {
    let mut tensors: HashMap<String, Tensor> = HashMap::new();
    for (name, var) in policy.named_vars() {
        tensors.insert(format!("policy.{}", name), var.as_tensor().clone());
    }
    for (name, m, v) in optimizer.moments() {
        tensors.insert(format!("adam.m.{}", name), m.clone());
        tensors.insert(format!("adam.v.{}", name), v.clone());
    }
    tensors.insert(
        STEP_KEY.to_string(),
        Tensor::new(&[optimizer.step_count() as i64], &Device::Cpu)?,
    );

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    safetensors::save(&tensors, &tmp)?;
    std::fs::rename(&tmp, path)?;

    info!("saved checkpoint to {}", path.display());
    Ok(())
}

/// Restores a checkpoint written by [`save`].
///
/// Every tensor is looked up and shape-checked before anything is written, so
/// a failed load leaves `policy` and `optimizer` untouched.
pub fn load(path: &Path, policy: &ActorCritic, optimizer: &mut Adam) -> Result<(), TrainingError> {
    let mut tensors = safetensors::load(path, policy.device())?;
    let vars = policy.named_vars();

    // 1. Validate
    let mut params = Vec::with_capacity(vars.len());
    let mut m = Vec::with_capacity(vars.len());
    let mut v = Vec::with_capacity(vars.len());
    for (name, var) in &vars {
        let dims = var.dims();
        params.push(take(&mut tensors, &format!("policy.{}", name), dims)?);
        m.push(take(&mut tensors, &format!("adam.m.{}", name), dims)?);
        v.push(take(&mut tensors, &format!("adam.v.{}", name), dims)?);
    }
    let step = tensors
        .remove(STEP_KEY)
        .ok_or_else(|| TrainingError::MissingTensor(STEP_KEY.to_string()))?
        .to_dtype(DType::I64)?
        .flatten_all()?
        .to_vec1::<i64>()?;
    let step = match step.as_slice() {
        [s] if *s >= 0 => *s as u64,
        _ => {
            return Err(TrainingError::ShapeMismatch {
                name: STEP_KEY.to_string(),
                expected: vec![1],
                found: vec![step.len()],
            })
        }
    };

    // 2. Apply
    for ((_, var), t) in vars.iter().zip(params) {
        var.set(&t)?;
    }
    optimizer.set_state(step, m, v)?;

    info!("loaded checkpoint from {} (adam step {})", path.display(), step);
    Ok(())
}

fn take(
    tensors: &mut HashMap<String, Tensor>,
    name: &str,
    expected: &[usize],
) -> Result<Tensor, TrainingError> {
    let t = tensors
        .remove(name)
        .ok_or_else(|| TrainingError::MissingTensor(name.to_string()))?;
    if t.dims() != expected {
        return Err(TrainingError::ShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            found: t.dims().to_vec(),
        });
    }
    Ok(t.to_dtype(DType::F32)?)
}
