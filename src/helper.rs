//! Debug visualizer for a [`Csm`].
//!
//! Produces renderer-agnostic geometry: per-cascade boxes and planes in the
//! camera's local frame, shadow-bound boxes in their light's frame, and the
//! line list of the main frustum. Everything is rebuilt from the
//! controller's public state on each [`CsmHelper::update`].

use glam::{Mat4, Vec3};
use log::{debug, warn};

use crate::{
    config::{HELPER_FLAT_EPSILON, HELPER_PLANE_OPACITY},
    core::scene::{NodeId, Scene},
    csm::Csm,
    error::Result,
    utils::math::Aabb,
};

/// Line-segment indices into [`CsmHelper::frustum_line_positions`]: far
/// quad, near quad, then the four edges joining them.
pub const FRUSTUM_LINE_INDICES: [u16; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, 4, 5, 5, 6, 6, 7, 7, 4, 0, 4, 1, 5, 2, 6, 3, 7,
];

/// Semi-transparent quad marking where a cascade ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadePlane {
    pub center: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
    pub visible: bool,
}

/// Debug geometry for one cascade.
#[derive(Debug, Clone)]
pub struct CascadeVisual {
    /// Far-plane box of the cascade, in camera-local space.
    pub cascade_box: Aabb,
    pub cascade_box_visible: bool,
    pub plane: CascadePlane,
    /// Node carrying the shadow camera's transform, parented to the helper.
    pub shadow_group: NodeId,
    /// Shadow camera volume in the shadow group's local space.
    pub shadow_box: Aabb,
    pub shadow_box_visible: bool,
}

pub struct CsmHelper {
    container: NodeId,
    pub display_frustum: bool,
    pub display_planes: bool,
    pub display_shadow_bounds: bool,
    visuals: Vec<CascadeVisual>,
    frustum_line_positions: [Vec3; 8],
    frustum_lines_visible: bool,
}

impl CsmHelper {
    /// Creates the helper's container node in the controller's scene.
    ///
    /// The container is not parented; add it where it should be drawn.
    pub fn new(csm: &Csm) -> Self {
        let container = csm.scene().write().create_node("csm_helper");
        Self {
            container,
            display_frustum: true,
            display_planes: true,
            display_shadow_bounds: true,
            visuals: Vec::new(),
            frustum_line_positions: [Vec3::ZERO; 8],
            frustum_lines_visible: true,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn visuals(&self) -> &[CascadeVisual] {
        &self.visuals
    }

    pub fn frustum_line_positions(&self) -> &[Vec3; 8] {
        &self.frustum_line_positions
    }

    pub fn frustum_lines_visible(&self) -> bool {
        self.frustum_lines_visible
    }

    /// World transform of the container, which follows the camera.
    pub fn world_matrix(&self, scene: &Scene) -> Option<Mat4> {
        scene.node(self.container).map(|node| node.world_matrix)
    }

    /// Applies the display toggles to every visual.
    pub fn update_visibility(&mut self) {
        for visual in &mut self.visuals {
            visual.cascade_box_visible = self.display_frustum;
            visual.plane.visible = self.display_frustum && self.display_planes;
            visual.shadow_box_visible = self.display_frustum && self.display_shadow_bounds;
        }
        self.frustum_lines_visible = self.display_frustum;
    }

    /// Rebuilds all debug geometry from the controller's current state.
    pub fn update(&mut self, csm: &Csm) {
        if let Err(err) = self.try_update(csm) {
            warn!("CSM helper: update failed: {err}");
        }
    }

    fn try_update(&mut self, csm: &Csm) -> Result<()> {
        let (position, rotation, scale) = {
            let camera = csm.camera().read();
            (camera.position, camera.rotation, camera.scale)
        };

        let mut scene = csm.scene().write();
        if let Some(node) = scene.node_mut(self.container) {
            node.position = position;
            node.rotation = rotation;
            node.scale = scale;
        }
        scene.update_matrix_world(self.container)?;

        self.resize_pool(&mut scene, csm.cascades());

        for ((visual, frustum), light) in self
            .visuals
            .iter_mut()
            .zip(csm.frustums())
            .zip(csm.lights())
        {
            let far = &frustum.vertices.far;

            let mut cascade_box = Aabb::new(far[2], far[0]);
            let mut plane_scale = cascade_box.size();
            plane_scale.z = HELPER_FLAT_EPSILON;
            visual.plane.center = cascade_box.center();
            visual.plane.scale = plane_scale;

            cascade_box.max.z += HELPER_FLAT_EPSILON;
            visual.cascade_box = cascade_box;

            if scene.node(visual.shadow_group).and_then(|n| n.parent()) == Some(self.container) {
                scene.remove(self.container, visual.shadow_group)?;
            }
            let light_world = scene
                .node(light.node())
                .map(|node| node.world_matrix)
                .unwrap_or(Mat4::IDENTITY);
            let (light_scale, light_rotation, light_position) =
                light_world.to_scale_rotation_translation();
            if let Some(group) = scene.node_mut(visual.shadow_group) {
                group.position = light_position;
                group.rotation = light_rotation;
                group.scale = light_scale;
            }
            scene.update_matrix_world(visual.shadow_group)?;
            scene.attach(self.container, visual.shadow_group)?;

            let shadow_camera = &light.shadow.camera;
            visual.shadow_box = Aabb::new(
                Vec3::new(shadow_camera.bottom, shadow_camera.left, -shadow_camera.far),
                Vec3::new(shadow_camera.top, shadow_camera.right, -shadow_camera.near),
            );
        }

        let main = csm.main_frustum();
        self.frustum_line_positions[..4].copy_from_slice(&main.vertices.far);
        self.frustum_line_positions[4..].copy_from_slice(&main.vertices.near);
        Ok(())
    }

    fn resize_pool(&mut self, scene: &mut Scene, cascades: usize) {
        while self.visuals.len() > cascades {
            if let Some(visual) = self.visuals.pop() {
                if let Err(err) = scene.destroy_node(visual.shadow_group) {
                    warn!("CSM helper: could not destroy shadow group: {err}");
                }
            }
        }

        while self.visuals.len() < cascades {
            let index = self.visuals.len();
            let shadow_group = scene.create_node(format!("csm_helper_shadow_{index}"));
            if let Err(err) = scene.add(self.container, shadow_group) {
                warn!("CSM helper: could not parent shadow group: {err}");
            }
            self.visuals.push(CascadeVisual {
                cascade_box: Aabb::empty(),
                cascade_box_visible: self.display_frustum,
                plane: CascadePlane {
                    center: Vec3::ZERO,
                    scale: Vec3::ONE,
                    opacity: HELPER_PLANE_OPACITY,
                    visible: self.display_frustum && self.display_planes,
                },
                shadow_group,
                shadow_box: Aabb::empty(),
                shadow_box_visible: self.display_frustum && self.display_shadow_bounds,
            });
        }
    }

    /// Destroys the helper's scene nodes.
    pub fn dispose(&mut self, scene: &mut Scene) {
        for visual in self.visuals.drain(..) {
            if let Err(err) = scene.destroy_node(visual.shadow_group) {
                warn!("CSM helper: could not destroy shadow group: {err}");
            }
        }
        if let Err(err) = scene.destroy_node(self.container) {
            warn!("CSM helper: could not destroy container: {err}");
        }
        debug!("CSM helper disposed");
    }
}
