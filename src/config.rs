//! Default configuration constants for the cascaded shadow controller.

/// Number of shadow cascades created when none is requested.
pub const DEFAULT_CASCADES: usize = 3;

/// Upper bound on the shadow-relevant view distance.
pub const DEFAULT_MAX_FAR: f32 = 1000.0;

/// Per-cascade shadow map resolution (texels per side).
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 2048;

/// Depth bias written into every cascade's shadow descriptor.
pub const DEFAULT_SHADOW_BIAS: f32 = 0.000_001;

/// Unnormalized default light direction; normalized on use.
pub const DEFAULT_LIGHT_DIRECTION: [f32; 3] = [1.0, -1.0, 1.0];

/// Intensity of every cascade light.
pub const DEFAULT_LIGHT_INTENSITY: f32 = 1.0;

/// Near plane of each cascade's orthographic shadow camera.
pub const DEFAULT_LIGHT_NEAR: f32 = 1.0;

/// Far plane of each cascade's orthographic shadow camera.
pub const DEFAULT_LIGHT_FAR: f32 = 2000.0;

/// Distance the light is pushed back along its own view axis.
pub const DEFAULT_LIGHT_MARGIN: f32 = 200.0;

/// Blend factor between uniform and logarithmic splits for the practical scheme.
pub const PRACTICAL_SPLIT_LAMBDA: f32 = 0.5;

/// World up axis used to orient cascade lights (Y-up).
pub const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];

/// Scale factor applied to the squared linear depth when fading cascades.
pub const FADE_MARGIN_FACTOR: f32 = 0.25;

/// Opacity of the debug visualizer's cascade planes.
pub const HELPER_PLANE_OPACITY: f32 = 0.1;

/// Thickness given to flat debug boxes and planes so they stay visible.
pub const HELPER_FLAT_EPSILON: f32 = 1e-4;
