use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::utils::math::look_at_quat;

/// Camera shared between the application and the shadow controller.
pub type SharedCamera = Arc<RwLock<Camera>>;

/// Projection model of a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Vertical field of view in radians and width / height aspect ratio.
    Perspective { fov_y: f32, aspect: f32 },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

/// Viewing camera. Looks down its local -Z axis, WebGL clip space.
#[derive(Debug, Clone)]
pub struct Camera {
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub world_matrix: Mat4,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

impl Camera {
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::with_projection(Projection::Perspective { fov_y, aspect }, near, far)
    }

    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self::with_projection(
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            },
            near,
            far,
        )
    }

    fn with_projection(projection: Projection, near: f32, far: f32) -> Self {
        let mut camera = Self {
            projection,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            world_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn into_shared(self) -> SharedCamera {
        Arc::new(RwLock::new(self))
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// Refreshes the world and view matrices from position, rotation and scale.
    pub fn update_matrix(&mut self) {
        self.world_matrix =
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.view_matrix = self.world_matrix.inverse();
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh_gl(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => Mat4::orthographic_rh_gl(left, right, bottom, top, self.near, self.far),
        };
    }

    /// Orients the camera toward `target` and refreshes its matrices.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.rotation = look_at_quat(self.position, target, up);
        self.update_matrix();
    }
}
