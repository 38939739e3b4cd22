//! Split schemes that divide the shadowed view range into cascades.
//!
//! Every scheme writes `amount` fractions of `far` into its target, strictly
//! increasing and ending with exactly `1.0`.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    config::PRACTICAL_SPLIT_LAMBDA,
    error::{CsmError, Result},
    utils::math::lerp,
};

/// Selects how cascade boundaries are distributed between near and far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Equal world-space depth per cascade.
    Uniform,
    /// Equal depth ratio per cascade.
    Logarithmic,
    /// Halfway between uniform and logarithmic.
    #[default]
    Practical,
    /// Delegates to a user callback.
    Custom,
}

/// User split callback: `(cascades, near, far, target)`.
///
/// The callback appends its fractions to `target`, which arrives empty.
#[derive(Clone)]
pub struct CustomSplitFn(Arc<dyn Fn(usize, f32, f32, &mut Vec<f32>) + Send + Sync>);

impl CustomSplitFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(usize, f32, f32, &mut Vec<f32>) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, cascades: usize, near: f32, far: f32, target: &mut Vec<f32>) {
        (self.0)(cascades, near, far, target)
    }
}

impl fmt::Debug for CustomSplitFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomSplitFn(..)")
    }
}

pub fn uniform_split(amount: usize, near: f32, far: f32, target: &mut Vec<f32>) {
    for i in 1..amount {
        target.push((near + (far - near) * i as f32 / amount as f32) / far);
    }
    target.push(1.0);
}

pub fn logarithmic_split(amount: usize, near: f32, far: f32, target: &mut Vec<f32>) {
    for i in 1..amount {
        target.push(near * (far / near).powf(i as f32 / amount as f32) / far);
    }
    target.push(1.0);
}

/// Blends the uniform and logarithmic fractions index by index.
pub fn practical_split(amount: usize, near: f32, far: f32, lambda: f32, target: &mut Vec<f32>) {
    let mut uniform = Vec::with_capacity(amount);
    let mut logarithmic = Vec::with_capacity(amount);
    uniform_split(amount, near, far, &mut uniform);
    logarithmic_split(amount, near, far, &mut logarithmic);

    for i in 1..amount {
        target.push(lerp(uniform[i - 1], logarithmic[i - 1], lambda));
    }
    target.push(1.0);
}

/// Clears `target` and fills it using the given scheme.
///
/// Zero cascades leave `target` empty. In custom mode without a callback
/// `target` is left empty and [`CsmError::MissingCustomSplitCallback`] is
/// returned.
pub fn compute_breaks(
    mode: SplitMode,
    custom: Option<&CustomSplitFn>,
    cascades: usize,
    near: f32,
    far: f32,
    target: &mut Vec<f32>,
) -> Result<()> {
    target.clear();
    if cascades == 0 {
        return Ok(());
    }
    match mode {
        SplitMode::Uniform => uniform_split(cascades, near, far, target),
        SplitMode::Logarithmic => logarithmic_split(cascades, near, far, target),
        SplitMode::Practical => {
            practical_split(cascades, near, far, PRACTICAL_SPLIT_LAMBDA, target)
        }
        SplitMode::Custom => {
            let callback = custom.ok_or(CsmError::MissingCustomSplitCallback)?;
            callback.call(cascades, near, far, target);
        }
    }
    Ok(())
}
