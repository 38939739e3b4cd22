//! Additional math helpers layered on top of `glam`.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotation matrix whose +Z axis points from `target` back to `eye`.
///
/// Right-handed, so an object with this orientation looks down its local -Z
/// toward `target`. When `eye == target` the +Z axis defaults to world +Z, and
/// when the view direction is parallel to `up` the direction is nudged so a
/// basis can still be built.
pub fn look_at_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let mut z = eye - target;
    if z.length_squared() == 0.0 {
        z.z = 1.0;
    }
    z = z.normalize();

    let mut x = up.cross(z);
    if x.length_squared() == 0.0 {
        if up.z.abs() == 1.0 {
            z.x += 0.0001;
        } else {
            z.z += 0.0001;
        }
        z = z.normalize();
        x = up.cross(z);
    }
    x = x.normalize();
    let y = z.cross(x);

    Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), glam::Vec4::W)
}

/// Quaternion form of [`look_at_rotation`].
pub fn look_at_quat(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    Quat::from_mat4(&look_at_rotation(eye, target, up)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_tracks_extents() {
        let bounds = Aabb::from_points(&[
            Vec3::new(-1.0, 2.0, 0.5),
            Vec3::new(3.0, -2.0, 1.5),
            Vec3::new(0.0, 0.0, -4.0),
        ]);
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 1.5));
        assert_eq!(bounds.center(), Vec3::new(1.0, 0.0, -1.25));
        assert_eq!(bounds.size(), Vec3::new(4.0, 4.0, 5.5));
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec3::new(4.0, -1.0, 0.0);
        let rotation = look_at_rotation(eye, target, Vec3::Y);

        let forward = rotation.transform_vector3(Vec3::NEG_Z);
        let expected = (target - eye).normalize();
        assert_relative_eq!(forward.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(forward.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(forward.z, expected.z, epsilon = 1e-5);
        assert_relative_eq!(rotation.determinant(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn look_at_survives_direction_parallel_to_up() {
        let rotation = look_at_rotation(Vec3::ZERO, Vec3::NEG_Y, Vec3::Y);
        assert!(rotation.is_finite());
        let forward = rotation.transform_vector3(Vec3::NEG_Z);
        assert!(forward.y < -0.99);
    }
}
