//! Cascaded shadow map controller.
//!
//! [`Csm`] splits the camera's shadowed range into cascades, sizes one
//! orthographic shadow camera per cascade and, every frame, places each
//! cascade light over its slice of the view frustum. Materials registered
//! with [`Csm::setup_material`] receive the defines, uniforms and lighting
//! chunks needed to pick the right cascade per fragment.
//!
//! Nothing here returns errors to the render loop: configuration problems
//! are logged and the controller keeps its last good state.

pub mod config;
pub mod fitting;
pub mod frustum;
pub mod shader_chunks;
pub mod split;

use std::sync::Arc;

use glam::{Mat4, UVec2, Vec2, Vec3};
use log::{debug, error, trace, warn};

use crate::{
    config::WORLD_UP,
    core::{
        camera::SharedCamera,
        light::CascadeLight,
        material::{Material, SharedMaterial, UniformValue},
        scene::{NodeId, SharedScene},
    },
    utils::{
        allocator::{Arena, ArenaId},
        logging::ScopedTimer,
        math::look_at_rotation,
    },
};

pub use config::CsmConfig;
pub use fitting::{shadow_window_size, snapped_light_center};
pub use frustum::{Frustum, FrustumVertices};
pub use shader_chunks::ShaderChunks;
pub use split::{CustomSplitFn, SplitMode};

pub const DEFINE_USE_CSM: &str = "USE_CSM";
pub const DEFINE_CASCADES: &str = "CSM_CASCADES";
pub const DEFINE_FADE: &str = "CSM_FADE";

pub const UNIFORM_CASCADES: &str = "CSM_cascades";
pub const UNIFORM_CAMERA_NEAR: &str = "cameraNear";
pub const UNIFORM_SHADOW_FAR: &str = "shadowFar";
pub const UNIFORM_DEBUG: &str = "CSM_debug";

/// Handle to a material registered with a [`Csm`].
pub type MaterialId = ArenaId;

/// What the controller remembers about a registered material.
#[derive(Debug, Clone)]
pub struct MaterialState {
    pub material: SharedMaterial,
    /// Cascade count last written into the material's `CSM_CASCADES` define.
    pub cascades: usize,
}

/// Per-instance temporaries reused across frames.
#[derive(Debug, Default)]
struct CascadeScratch {
    light_orientation: Mat4,
    light_orientation_inverse: Mat4,
    centers: Vec<Vec3>,
    breaks: Vec<f32>,
    extended_breaks: Vec<Vec2>,
}

pub struct Csm {
    camera: SharedCamera,
    scene: SharedScene,
    parent: NodeId,
    cascades: usize,
    /// Shadow-relevant view distance. Call [`Csm::update_frustums`] after changing it.
    pub max_far: f32,
    /// Call [`Csm::update_frustums`] after changing it.
    pub mode: SplitMode,
    pub shadow_map_size: u32,
    pub shadow_bias: f32,
    /// Shared by all cascade lights. Must be normalized.
    pub light_direction: Vec3,
    pub light_intensity: f32,
    pub light_near: f32,
    pub light_far: f32,
    pub light_margin: f32,
    pub custom_splits: Option<CustomSplitFn>,
    pub fade: bool,
    pub debug: bool,
    main_frustum: Frustum,
    frustums: Vec<Frustum>,
    breaks: Vec<f32>,
    lights: Vec<CascadeLight>,
    materials: Arena<MaterialState>,
    chunks: Arc<ShaderChunks>,
    scratch: CascadeScratch,
}

impl Csm {
    /// Creates the cascade lights under `parent` and computes the initial cascades.
    ///
    /// The camera's projection and world matrices are read as they are; the
    /// application keeps them current.
    pub fn new(camera: SharedCamera, scene: SharedScene, parent: NodeId, config: CsmConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("CSM: {err}");
        }

        let mut csm = Self {
            camera,
            scene,
            parent,
            cascades: config.cascades,
            max_far: config.max_far,
            mode: config.mode,
            shadow_map_size: config.shadow_map_size,
            shadow_bias: config.shadow_bias,
            light_direction: config.light_direction,
            light_intensity: config.light_intensity,
            light_near: config.light_near,
            light_far: config.light_far,
            light_margin: config.light_margin,
            custom_splits: config.custom_splits,
            fade: config.fade,
            debug: config.debug,
            main_frustum: Frustum::default(),
            frustums: Vec::new(),
            breaks: Vec::new(),
            lights: Vec::new(),
            materials: Arena::new(),
            chunks: Arc::new(ShaderChunks::cascaded()),
            scratch: CascadeScratch::default(),
        };

        csm.create_lights();
        csm.update_frustums();
        debug!("CSM: created {} cascades ({:?} split)", csm.cascades, csm.mode);
        csm
    }

    /// Creates one shadow-casting light per cascade and parents it, with its
    /// target, under the controller's parent node.
    ///
    /// Lights created by an earlier call are destroyed first, so the light
    /// count always matches [`Csm::cascades`].
    pub fn create_lights(&mut self) {
        let mut scene = self.scene.write();

        for light in self.lights.drain(..) {
            for node in [light.node(), light.target()] {
                if let Err(err) = scene.destroy_node(node) {
                    warn!("CSM: could not destroy light node: {err}");
                }
            }
        }

        for i in 0..self.cascades {
            let mut light = CascadeLight::new(&mut scene, i, self.light_intensity);
            light.cast_shadow = true;
            light.shadow.map_size = UVec2::splat(self.shadow_map_size);
            light.shadow.bias = self.shadow_bias;
            light.shadow.camera.near = self.light_near;
            light.shadow.camera.far = self.light_far;
            light.shadow.camera.update_projection_matrix();

            for node in [light.node(), light.target()] {
                if let Err(err) = scene.add(self.parent, node) {
                    error!("CSM: could not add light node to parent: {err}");
                }
            }
            self.lights.push(light);
        }
    }

    /// Recomputes the splits, the cascade frusta and their shadow bounds,
    /// then refreshes material uniforms.
    ///
    /// Run after changing `mode`, `max_far`, `fade` or the custom split
    /// callback, and after the camera's projection changes. If the splits
    /// cannot be computed the previous cascades are kept.
    pub fn update_frustums(&mut self) {
        let _timer = ScopedTimer::new("csm::update_frustums");

        if !self.update_breaks() {
            return;
        }
        self.init_cascades();
        self.update_shadow_bounds();
        self.update_uniforms();
    }

    fn update_breaks(&mut self) -> bool {
        let (near, far) = {
            let camera = self.camera.read();
            (camera.near, camera.far.min(self.max_far))
        };

        let result = split::compute_breaks(
            self.mode,
            self.custom_splits.as_ref(),
            self.cascades,
            near,
            far,
            &mut self.scratch.breaks,
        );

        match result {
            Ok(()) => {
                std::mem::swap(&mut self.breaks, &mut self.scratch.breaks);
                if self.breaks.len() != self.cascades {
                    warn!(
                        "CSM: split scheme produced {} breaks for {} cascades",
                        self.breaks.len(),
                        self.cascades
                    );
                }
                trace!("CSM: breaks {:?}", self.breaks);
                true
            }
            Err(err) => {
                error!("CSM: {err}; keeping previous cascade splits");
                false
            }
        }
    }

    fn init_cascades(&mut self) {
        let projection = self.camera.read().projection_matrix;
        self.main_frustum
            .set_from_projection_matrix(&projection, self.max_far);
        self.main_frustum.split(&self.breaks, &mut self.frustums);
    }

    fn update_shadow_bounds(&mut self) {
        let (camera_near, far) = {
            let camera = self.camera.read();
            (camera.near, camera.far.max(self.max_far))
        };

        for (frustum, light) in self.frustums.iter().zip(self.lights.iter_mut()) {
            let width = shadow_window_size(frustum, self.fade, camera_near, far);

            let shadow = &mut light.shadow;
            shadow.camera.set_square(width);
            shadow.camera.near = self.light_near;
            shadow.camera.far = self.light_far;
            shadow.camera.update_projection_matrix();
            shadow.window_size = width;
            shadow.camera_near = self.light_near;
            shadow.camera_far = self.light_far;
        }
    }

    /// Moves every cascade light over its slice of the current view frustum.
    ///
    /// Call once per frame after the camera's world matrix is updated.
    pub fn update(&mut self) {
        let _timer = ScopedTimer::new("csm::update");

        let camera_world = self.camera.read().world_matrix;
        let up = Vec3::from(WORLD_UP);

        self.scratch.light_orientation = look_at_rotation(Vec3::ZERO, self.light_direction, up);
        self.scratch.light_orientation_inverse = self.scratch.light_orientation.inverse();
        let camera_to_light = self.scratch.light_orientation_inverse * camera_world;

        self.compute_light_centers(&camera_to_light);

        let mut scene = self.scene.write();
        for (light, center) in self.lights.iter().zip(&self.scratch.centers) {
            let position = self.scratch.light_orientation.transform_point3(*center);
            if let Err(err) = light.place(&mut scene, position, self.light_direction, up) {
                warn!("CSM: could not place cascade light: {err}");
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn compute_light_centers(&mut self, camera_to_light: &Mat4) {
        let (size, margin) = (self.shadow_map_size, self.light_margin);
        self.scratch.centers.clear();
        self.scratch.centers.extend(
            self.frustums
                .iter()
                .zip(&self.lights)
                .map(|(frustum, light)| {
                    snapped_light_center(frustum, camera_to_light, &light.shadow.camera, size, margin)
                }),
        );
    }

    #[cfg(feature = "parallel")]
    fn compute_light_centers(&mut self, camera_to_light: &Mat4) {
        use rayon::prelude::*;

        let (size, margin) = (self.shadow_map_size, self.light_margin);
        self.frustums
            .par_iter()
            .zip(self.lights.par_iter())
            .map(|(frustum, light)| {
                snapped_light_center(frustum, camera_to_light, &light.shadow.camera, size, margin)
            })
            .collect_into_vec(&mut self.scratch.centers);
    }

    /// Registers a material, adding the cascade defines, uniforms and the
    /// controller's lighting chunks.
    ///
    /// Registering the same material again returns its existing id.
    pub fn setup_material(&mut self, material: &SharedMaterial) -> MaterialId {
        if let Some(id) = self.material_id(material) {
            debug!("CSM: material already registered");
            return id;
        }

        let (camera_near, shadow_far) = self.uniform_range();
        let mut pairs = std::mem::take(&mut self.scratch.extended_breaks);
        self.get_extended_breaks(&mut pairs);

        {
            let mut guard = material.write();
            let material = &mut *guard;
            material
                .defines
                .insert(DEFINE_USE_CSM.to_owned(), "1".to_owned());
            material
                .defines
                .insert(DEFINE_CASCADES.to_owned(), self.cascades.to_string());
            if self.fade {
                material.defines.insert(DEFINE_FADE.to_owned(), String::new());
            }
            material.shader_chunks = Some(Arc::clone(&self.chunks));
            self.write_uniforms(material, &pairs, camera_near, shadow_far);
            material.needs_update = true;
            debug!("CSM: configured material '{}'", material.name);
        }

        self.scratch.extended_breaks = pairs;
        self.materials.insert(MaterialState {
            material: Arc::clone(material),
            cascades: self.cascades,
        })
    }

    /// Refreshes uniforms on every registered material and keeps the
    /// `CSM_FADE` define in sync with [`Csm::fade`].
    ///
    /// A material is flagged for recompilation only when its fade define is
    /// added or removed.
    pub fn update_uniforms(&mut self) {
        let (camera_near, shadow_far) = self.uniform_range();
        let mut pairs = std::mem::take(&mut self.scratch.extended_breaks);
        self.get_extended_breaks(&mut pairs);

        for (_, state) in self.materials.iter() {
            let mut guard = state.material.write();
            let material = &mut *guard;
            self.write_uniforms(material, &pairs, camera_near, shadow_far);

            let has_fade = material.has_define(DEFINE_FADE);
            if self.fade && !has_fade {
                material.defines.insert(DEFINE_FADE.to_owned(), String::new());
                material.needs_update = true;
            } else if !self.fade && has_fade {
                material.defines.remove(DEFINE_FADE);
                material.needs_update = true;
            }
        }

        self.scratch.extended_breaks = pairs;
    }

    fn uniform_range(&self) -> (f32, f32) {
        let camera = self.camera.read();
        (camera.near, camera.far.min(self.max_far))
    }

    fn write_uniforms(&self, material: &mut Material, pairs: &[Vec2], camera_near: f32, shadow_far: f32) {
        match material.uniforms.get_mut(UNIFORM_CASCADES) {
            Some(UniformValue::Vec2Array(values)) => {
                values.clear();
                values.extend_from_slice(pairs);
            }
            _ => {
                material.uniforms.insert(
                    UNIFORM_CASCADES.to_owned(),
                    UniformValue::Vec2Array(pairs.to_vec()),
                );
            }
        }
        material
            .uniforms
            .insert(UNIFORM_CAMERA_NEAR.to_owned(), UniformValue::Float(camera_near));
        material
            .uniforms
            .insert(UNIFORM_SHADOW_FAR.to_owned(), UniformValue::Float(shadow_far));
        material
            .uniforms
            .insert(UNIFORM_DEBUG.to_owned(), UniformValue::Bool(self.debug));
    }

    /// Writes each cascade's `(start, end)` fractions into `target`.
    pub fn get_extended_breaks(&self, target: &mut Vec<Vec2>) {
        target.resize(self.breaks.len(), Vec2::ZERO);
        let mut previous = 0.0;
        for (pair, &amount) in target.iter_mut().zip(&self.breaks) {
            *pair = Vec2::new(previous, amount);
            previous = amount;
        }
    }

    /// Changes the cascade count, rebuilding lights and cascades and
    /// updating the `CSM_CASCADES` define of registered materials.
    pub fn set_cascades(&mut self, cascades: usize) {
        if cascades == 0 {
            warn!("CSM: cascade count set to zero");
        }
        self.cascades = cascades;
        self.create_lights();
        self.update_frustums();

        for (_, state) in self.materials.iter_mut() {
            if state.cascades == cascades {
                continue;
            }
            let mut material = state.material.write();
            material
                .defines
                .insert(DEFINE_CASCADES.to_owned(), cascades.to_string());
            material.needs_update = true;
            state.cascades = cascades;
        }
    }

    /// Detaches every cascade light and its target from the parent node.
    pub fn remove(&mut self) {
        let mut scene = self.scene.write();
        for light in &self.lights {
            for node in [light.node(), light.target()] {
                if let Err(err) = scene.remove(self.parent, node) {
                    warn!("CSM: could not detach light node: {err}");
                }
            }
        }
    }

    /// Strips cascade defines, uniforms and lighting chunks from every
    /// registered material and forgets them.
    pub fn dispose(&mut self) {
        for (_, state) in self.materials.iter() {
            let mut material = state.material.write();
            for define in [DEFINE_USE_CSM, DEFINE_CASCADES, DEFINE_FADE] {
                material.defines.remove(define);
            }
            for uniform in [UNIFORM_CASCADES, UNIFORM_CAMERA_NEAR, UNIFORM_SHADOW_FAR, UNIFORM_DEBUG] {
                material.uniforms.remove(uniform);
            }
            if material
                .shader_chunks
                .as_ref()
                .is_some_and(|chunks| Arc::ptr_eq(chunks, &self.chunks))
            {
                material.shader_chunks = None;
            }
            material.needs_update = true;
        }
        debug!("CSM: disposed {} materials", self.materials.len());
        self.materials.clear();
    }

    pub fn cascades(&self) -> usize {
        self.cascades
    }

    pub fn breaks(&self) -> &[f32] {
        &self.breaks
    }

    pub fn main_frustum(&self) -> &Frustum {
        &self.main_frustum
    }

    pub fn frustums(&self) -> &[Frustum] {
        &self.frustums
    }

    pub fn lights(&self) -> &[CascadeLight] {
        &self.lights
    }

    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn shader_chunks(&self) -> &Arc<ShaderChunks> {
        &self.chunks
    }

    pub fn material_state(&self, id: MaterialId) -> Option<&MaterialState> {
        self.materials.get(id)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn material_id(&self, material: &SharedMaterial) -> Option<MaterialId> {
        self.materials
            .iter()
            .find(|(_, state)| Arc::ptr_eq(&state.material, material))
            .map(|(id, _)| id)
    }

    /// World position of cascade `index`'s light.
    pub fn light_position(&self, index: usize) -> Option<Vec3> {
        let light = self.lights.get(index)?;
        let scene = self.scene.read();
        scene.node(light.node()).map(|node| node.world_position())
    }

    /// World position the cascade `index` light is aimed at.
    pub fn light_target(&self, index: usize) -> Option<Vec3> {
        let light = self.lights.get(index)?;
        let scene = self.scene.read();
        scene.node(light.target()).map(|node| node.world_position())
    }
}
