use glam::{Mat4, UVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    core::scene::{NodeId, Scene},
    error::Result,
};

/// Orthographic camera used to render one cascade's shadow map.
///
/// Positioned by its light's scene node; only the box extents live here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthographicShadowCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub projection_matrix: Mat4,
}

impl Default for OrthographicShadowCamera {
    fn default() -> Self {
        let mut camera = Self {
            left: -1.0,
            right: 1.0,
            top: 1.0,
            bottom: -1.0,
            near: 0.5,
            far: 500.0,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }
}

impl OrthographicShadowCamera {
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::orthographic_rh_gl(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        );
    }

    /// Sets a square box of side `size` centered on the light axis.
    pub fn set_square(&mut self, size: f32) {
        let half = size * 0.5;
        self.left = -half;
        self.right = half;
        self.top = half;
        self.bottom = -half;
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Shadow settings of a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalShadow {
    pub map_size: UVec2,
    pub bias: f32,
    /// Side length of the square shadow window in world units.
    pub window_size: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera: OrthographicShadowCamera,
}

impl Default for DirectionalShadow {
    fn default() -> Self {
        Self {
            map_size: UVec2::splat(512),
            bias: 0.0,
            window_size: 2.0,
            camera_near: 0.5,
            camera_far: 500.0,
            camera: OrthographicShadowCamera::default(),
        }
    }
}

/// One cascade's shadow-casting directional light.
///
/// The light and its aim target are scene nodes so they can live under an
/// application-provided parent. The light shines from `node` toward `target`.
#[derive(Debug, Clone)]
pub struct CascadeLight {
    node: NodeId,
    target: NodeId,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: DirectionalShadow,
}

impl CascadeLight {
    /// Creates the light and target nodes in `scene` without parenting them.
    pub fn new(scene: &mut Scene, cascade: usize, intensity: f32) -> Self {
        let node = scene.create_node(format!("csm_light_{cascade}"));
        let target = scene.create_node(format!("csm_light_{cascade}_target"));
        Self {
            node,
            target,
            intensity,
            cast_shadow: false,
            shadow: DirectionalShadow::default(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Places the light at `position`, aims it along `direction` and
    /// refreshes both world matrices.
    pub fn place(&self, scene: &mut Scene, position: Vec3, direction: Vec3, up: Vec3) -> Result<()> {
        let target = position + direction;
        if let Some(node) = scene.node_mut(self.node) {
            node.position = position;
        }
        if let Some(node) = scene.node_mut(self.target) {
            node.position = target;
        }
        scene.look_at(self.node, target, up)?;
        scene.update_world_matrix(self.node, true, false)?;
        scene.update_world_matrix(self.target, true, false)
    }
}
