//! Cascaded Shadows – cascaded shadow maps for directional lights.
//!
//! The [`Csm`] controller splits a camera's view range into cascades, fits an
//! orthographic shadow camera to each one and keeps one directional light per
//! cascade snapped to its shadow-map texel grid as the camera moves. Materials
//! registered with the controller receive the defines, uniforms and lighting
//! chunks a forward renderer needs to sample the right cascade. [`CsmHelper`]
//! turns the controller's state into debug geometry.

pub mod config;
pub mod core;
pub mod csm;
pub mod error;
pub mod helper;
pub mod utils;

pub use glam::{Mat4, Quat, Vec2, Vec3};

pub use core::{
    camera::{Camera, Projection, SharedCamera},
    light::{CascadeLight, DirectionalShadow, OrthographicShadowCamera},
    material::{Material, SharedMaterial, UniformValue},
    scene::{NodeId, Object3D, Scene, SharedScene},
};
pub use csm::{
    config::CsmConfig,
    frustum::{Frustum, FrustumVertices},
    shader_chunks::ShaderChunks,
    split::{CustomSplitFn, SplitMode},
    Csm, MaterialId, MaterialState,
};
pub use error::{CsmError, Result};
pub use helper::{CascadePlane, CascadeVisual, CsmHelper};
pub use utils::allocator::{Arena, ArenaId};
