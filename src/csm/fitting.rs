//! Shadow camera sizing and light-space placement for a single cascade.

use glam::{Mat4, Vec3};

use crate::{
    config::FADE_MARGIN_FACTOR, core::light::OrthographicShadowCamera, csm::frustum::Frustum,
    utils::math::Aabb,
};

/// Side length of the square shadow window that covers `frustum`.
///
/// The window spans the longer of the far-plane diagonal and the diagonal
/// from the far-plane corner 0 to the near-plane corner 2. With `fade`
/// enabled it grows by `0.25 * depth^2 * (far - near)` where `depth` is the
/// cascade's far-plane depth relative to `far - near`.
pub fn shadow_window_size(frustum: &Frustum, fade: bool, camera_near: f32, far: f32) -> f32 {
    let near_verts = &frustum.vertices.near;
    let far_verts = &frustum.vertices.far;

    let point1 = far_verts[0];
    let point2 = if point1.distance(far_verts[2]) > point1.distance(near_verts[2]) {
        far_verts[2]
    } else {
        near_verts[2]
    };
    let mut width = point1.distance(point2);

    if fade {
        let range = far - camera_near;
        let linear_depth = far_verts[0].z / range;
        width += FADE_MARGIN_FACTOR * linear_depth * linear_depth * range;
    }

    width
}

/// Light-space position of a cascade light, snapped to the shadow texel grid.
///
/// `camera_to_light` maps the cascade's camera-space corners into the light's
/// orientation frame. The light sits over the centre of their bounds and
/// `light_margin` behind the nearest corner along its view axis.
pub fn snapped_light_center(
    frustum: &Frustum,
    camera_to_light: &Mat4,
    shadow_camera: &OrthographicShadowCamera,
    shadow_map_size: u32,
    light_margin: f32,
) -> Vec3 {
    let mut light_space = Frustum::default();
    frustum.to_space(camera_to_light, &mut light_space);

    let mut bbox = Aabb::empty();
    for corner in light_space.vertices.iter() {
        bbox.extend(*corner);
    }

    let texel_width = shadow_camera.width() / shadow_map_size as f32;
    let texel_height = shadow_camera.height() / shadow_map_size as f32;

    let mut center = bbox.center();
    center.z = bbox.max.z + light_margin;
    center.x = (center.x / texel_width).floor() * texel_width;
    center.y = (center.y / texel_height).floor() * texel_height;
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cascade() -> Frustum {
        let projection = Mat4::perspective_rh_gl(50f32.to_radians(), 1.0, 0.5, 200.0);
        Frustum::from_projection_matrix(&projection, 200.0)
    }

    #[test]
    fn window_covers_far_plane_diagonal() {
        let frustum = cascade();
        let diagonal = frustum.vertices.far[0].distance(frustum.vertices.far[2]);
        let width = shadow_window_size(&frustum, false, 0.5, 200.0);
        assert!(width >= diagonal);
    }

    #[test]
    fn long_thin_cascade_uses_body_diagonal() {
        let mut frustum = Frustum::default();
        frustum.vertices.near = [
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ];
        frustum.vertices.far = frustum.vertices.near.map(|v| Vec3::new(v.x, v.y, -100.0));

        let width = shadow_window_size(&frustum, false, 1.0, 100.0);
        let expected = Vec3::new(1.0, 1.0, -100.0).distance(Vec3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(width, expected, epsilon = 1e-4);
    }

    #[test]
    fn fade_adds_quadratic_margin() {
        let frustum = cascade();
        let plain = shadow_window_size(&frustum, false, 0.5, 200.0);
        let faded = shadow_window_size(&frustum, true, 0.5, 200.0);

        let depth = frustum.vertices.far[0].z / 199.5;
        assert_relative_eq!(faded - plain, 0.25 * depth * depth * 199.5, epsilon = 1e-2);
        assert!(faded > plain);
    }

    #[test]
    fn center_is_texel_aligned_and_behind_bounds() {
        let frustum = cascade();
        let mut shadow_camera = OrthographicShadowCamera::default();
        shadow_camera.set_square(64.0);
        let rotation = Mat4::from_rotation_y(0.3) * Mat4::from_translation(Vec3::new(3.3, 0.7, -1.9));

        let center = snapped_light_center(&frustum, &rotation, &shadow_camera, 256, 25.0);

        let texel = 64.0 / 256.0;
        assert_relative_eq!(center.x, (center.x / texel).round() * texel, epsilon = 1e-5);
        assert_relative_eq!(center.y, (center.y / texel).round() * texel, epsilon = 1e-5);

        let max_z = frustum
            .vertices
            .iter()
            .map(|v| rotation.transform_point3(*v).z)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(center.z, max_z + 25.0, epsilon = 1e-3);
    }

    #[test]
    fn snapping_floors_toward_negative_infinity() {
        let mut frustum = Frustum::default();
        let corner = Vec3::new(-0.3, 0.3, -1.0);
        frustum.vertices.near = [corner; 4];
        frustum.vertices.far = [corner; 4];
        let mut shadow_camera = OrthographicShadowCamera::default();
        shadow_camera.set_square(4.0);

        let center = snapped_light_center(&frustum, &Mat4::IDENTITY, &shadow_camera, 4, 0.0);
        assert_eq!(center.x, -1.0);
        assert_eq!(center.y, 0.0);
    }
}
