use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    config::*,
    csm::split::{CustomSplitFn, SplitMode},
    error::{CsmError, Result},
};

/// Construction options for [`Csm`](crate::csm::Csm).
///
/// Missing fields fall back to their defaults when deserialized. The custom
/// split callback is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsmConfig {
    pub cascades: usize,
    /// Shadows are only cast up to this view distance, even if the camera
    /// draws further.
    pub max_far: f32,
    pub mode: SplitMode,
    pub shadow_map_size: u32,
    pub shadow_bias: f32,
    pub light_direction: Vec3,
    pub light_intensity: f32,
    pub light_near: f32,
    pub light_far: f32,
    pub light_margin: f32,
    /// Pads later cascades so neighbouring cascades can be blended.
    pub fade: bool,
    /// Tints fragments by cascade index.
    pub debug: bool,
    #[serde(skip)]
    pub custom_splits: Option<CustomSplitFn>,
}

impl Default for CsmConfig {
    fn default() -> Self {
        Self {
            cascades: DEFAULT_CASCADES,
            max_far: DEFAULT_MAX_FAR,
            mode: SplitMode::default(),
            shadow_map_size: DEFAULT_SHADOW_MAP_SIZE,
            shadow_bias: DEFAULT_SHADOW_BIAS,
            light_direction: Vec3::from(DEFAULT_LIGHT_DIRECTION).normalize(),
            light_intensity: DEFAULT_LIGHT_INTENSITY,
            light_near: DEFAULT_LIGHT_NEAR,
            light_far: DEFAULT_LIGHT_FAR,
            light_margin: DEFAULT_LIGHT_MARGIN,
            fade: false,
            debug: false,
            custom_splits: None,
        }
    }
}

impl CsmConfig {
    pub fn with_cascades(mut self, cascades: usize) -> Self {
        self.cascades = cascades;
        self
    }

    pub fn with_max_far(mut self, max_far: f32) -> Self {
        self.max_far = max_far;
        self
    }

    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn with_light_direction(mut self, direction: Vec3) -> Self {
        self.light_direction = direction.normalize_or_zero();
        self
    }

    pub fn with_light_margin(mut self, margin: f32) -> Self {
        self.light_margin = margin;
        self
    }

    pub fn with_fade(mut self, fade: bool) -> Self {
        self.fade = fade;
        self
    }

    /// Registers a custom split callback and switches to [`SplitMode::Custom`].
    pub fn with_custom_splits<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, f32, f32, &mut Vec<f32>) + Send + Sync + 'static,
    {
        self.custom_splits = Some(CustomSplitFn::new(callback));
        self.mode = SplitMode::Custom;
        self
    }

    /// Reports the first setting that would produce degenerate cascades.
    pub fn validate(&self) -> Result<()> {
        if self.cascades == 0 {
            return Err(CsmError::InvalidConfig("cascades must be at least 1".into()));
        }
        if self.max_far <= 0.0 {
            return Err(CsmError::InvalidConfig(format!(
                "max_far must be positive, got {}",
                self.max_far
            )));
        }
        if self.shadow_map_size == 0 {
            return Err(CsmError::InvalidConfig("shadow_map_size must be non-zero".into()));
        }
        if self.light_direction.length_squared() == 0.0 {
            return Err(CsmError::InvalidConfig("light_direction must be non-zero".into()));
        }
        if self.light_near >= self.light_far {
            return Err(CsmError::InvalidConfig(format!(
                "light_near ({}) must be below light_far ({})",
                self.light_near, self.light_far
            )));
        }
        if self.mode == SplitMode::Custom && self.custom_splits.is_none() {
            return Err(CsmError::MissingCustomSplitCallback);
        }
        Ok(())
    }
}
