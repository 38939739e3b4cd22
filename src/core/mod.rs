//! Collaborator types the shadow controller drives: camera, scene graph,
//! cascade lights and materials.

pub mod camera;
pub mod light;
pub mod material;
pub mod scene;

pub use camera::{Camera, Projection, SharedCamera};
pub use light::{CascadeLight, DirectionalShadow, OrthographicShadowCamera};
pub use material::{Material, SharedMaterial, UniformValue};
pub use scene::{NodeId, Object3D, Scene, SharedScene};
