//! Camera-space view frustum described by its eight corners.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Near and far plane corners. Both quads use the same winding:
///
/// ```text
/// 3 --- 0
/// |     |
/// 2 --- 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrustumVertices {
    pub near: [Vec3; 4],
    pub far: [Vec3; 4],
}

impl FrustumVertices {
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.near.iter().chain(self.far.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frustum {
    pub vertices: FrustumVertices,
}

const CLIP_CORNERS: [(f32, f32); 4] = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];

impl Frustum {
    pub fn from_projection_matrix(projection: &Mat4, max_far: f32) -> Self {
        let mut frustum = Self::default();
        frustum.set_from_projection_matrix(projection, max_far);
        frustum
    }

    /// Unprojects the clip-space cube into camera space, pulling the far
    /// corners in so none lies deeper than `max_far`.
    pub fn set_from_projection_matrix(&mut self, projection: &Mat4, max_far: f32) -> &FrustumVertices {
        let is_orthographic = projection.z_axis.w == 0.0;
        let inverse = projection.inverse();

        for (corner, (x, y)) in self.vertices.near.iter_mut().zip(CLIP_CORNERS) {
            *corner = inverse.project_point3(Vec3::new(x, y, -1.0));
        }

        for (corner, (x, y)) in self.vertices.far.iter_mut().zip(CLIP_CORNERS) {
            let v = inverse.project_point3(Vec3::new(x, y, 1.0));
            let clamp = (max_far / v.z.abs()).min(1.0);
            *corner = if is_orthographic {
                Vec3::new(v.x, v.y, v.z * clamp)
            } else {
                v * clamp
            };
        }

        &self.vertices
    }

    /// Splits into `breaks.len()` contiguous sub-frusta, resizing `target`.
    ///
    /// Cascade `i` spans fractions `breaks[i-1]..breaks[i]` of the way from
    /// the near to the far corners; the first starts on the near plane and
    /// the last ends on the far plane.
    pub fn split(&self, breaks: &[f32], target: &mut Vec<Frustum>) {
        target.resize(breaks.len(), Frustum::default());
        let last = breaks.len().saturating_sub(1);

        for (i, cascade) in target.iter_mut().enumerate() {
            for j in 0..4 {
                let near = self.vertices.near[j];
                let far = self.vertices.far[j];

                cascade.vertices.near[j] = if i == 0 {
                    near
                } else {
                    near.lerp(far, breaks[i - 1])
                };

                cascade.vertices.far[j] = if i == last {
                    far
                } else {
                    near.lerp(far, breaks[i])
                };
            }
        }
    }

    /// Writes this frustum transformed by `matrix` into `target`.
    pub fn to_space(&self, matrix: &Mat4, target: &mut Frustum) {
        for j in 0..4 {
            target.vertices.near[j] = matrix.transform_point3(self.vertices.near[j]);
            target.vertices.far[j] = matrix.transform_point3(self.vertices.far[j]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn perspective() -> Mat4 {
        Mat4::perspective_rh_gl(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }

    #[test]
    fn far_corners_clamped_to_max_far() {
        let frustum = Frustum::from_projection_matrix(&perspective(), 250.0);
        for corner in frustum.vertices.near {
            assert_relative_eq!(corner.z, -0.1, epsilon = 1e-4);
        }
        for corner in frustum.vertices.far {
            assert_relative_eq!(corner.z, -250.0, epsilon = 0.05);
        }
    }

    #[test]
    fn far_corners_keep_projection_far_when_shorter() {
        let frustum = Frustum::from_projection_matrix(&perspective(), 5000.0);
        for corner in frustum.vertices.far {
            assert_relative_eq!(corner.z, -1000.0, max_relative = 1e-3);
        }
    }

    #[test]
    fn perspective_clamp_keeps_corner_on_its_ray() {
        let unclamped = Frustum::from_projection_matrix(&perspective(), 5000.0);
        let clamped = Frustum::from_projection_matrix(&perspective(), 100.0);
        let a = unclamped.vertices.far[0].normalize();
        let b = clamped.vertices.far[0].normalize();
        assert!(a.abs_diff_eq(b, 1e-4));
    }

    #[test]
    fn orthographic_clamp_only_moves_depth() {
        let projection = Mat4::orthographic_rh_gl(-20.0, 20.0, -10.0, 10.0, 1.0, 400.0);
        let frustum = Frustum::from_projection_matrix(&projection, 100.0);
        let far = frustum.vertices.far[0];
        assert_relative_eq!(far.x, 20.0, epsilon = 1e-3);
        assert_relative_eq!(far.y, 10.0, epsilon = 1e-3);
        assert_relative_eq!(far.z, -100.0, epsilon = 1e-2);
    }

    #[test]
    fn split_cascades_are_contiguous() {
        let main = Frustum::from_projection_matrix(&perspective(), 300.0);
        let breaks = [0.1, 0.35, 1.0];
        let mut cascades = Vec::new();
        main.split(&breaks, &mut cascades);

        assert_eq!(cascades.len(), 3);
        assert_eq!(cascades[0].vertices.near, main.vertices.near);
        assert_eq!(cascades[2].vertices.far, main.vertices.far);
        for i in 1..cascades.len() {
            assert_eq!(cascades[i].vertices.near, cascades[i - 1].vertices.far);
        }
    }

    #[test]
    fn split_shrinks_target() {
        let main = Frustum::from_projection_matrix(&perspective(), 300.0);
        let mut cascades = vec![Frustum::default(); 5];
        main.split(&[1.0], &mut cascades);
        assert_eq!(cascades.len(), 1);
        assert_eq!(cascades[0], main);
    }

    #[test]
    fn to_space_translates_every_corner() {
        let main = Frustum::from_projection_matrix(&perspective(), 50.0);
        let mut moved = Frustum::default();
        let offset = Vec3::new(1.0, 2.0, 3.0);
        main.to_space(&Mat4::from_translation(offset), &mut moved);
        for (a, b) in main.vertices.iter().zip(moved.vertices.iter()) {
            assert!((*a + offset).abs_diff_eq(*b, 1e-5));
        }
    }
}
