//! Minimal scene graph: transform nodes stored in a generational arena.
//!
//! Cascade lights and their targets live here so they can be parented under
//! an application node and inherit its transform. `attach`, `apply_matrix4`
//! and `update_world_matrix` are plain methods on [`Scene`].

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use parking_lot::RwLock;

use crate::{
    error::{CsmError, Result},
    utils::{
        allocator::{Arena, ArenaId},
        math::look_at_quat,
    },
};

/// Handle to a node inside a [`Scene`].
pub type NodeId = ArenaId;

/// Scene shared between the application and the shadow controller.
pub type SharedScene = Arc<RwLock<Scene>>;

/// A transform node. Local TRS plus cached local and world matrices.
#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub matrix: Mat4,
    pub world_matrix: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Recomposes the local matrix from position, rotation and scale.
    pub fn update_matrix(&mut self) {
        self.matrix = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }
}

#[derive(Default)]
pub struct Scene {
    nodes: Arena<Object3D>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedScene {
        Arc::new(RwLock::new(self))
    }

    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Object3D::new(name))
    }

    /// Detaches the node from its parent, orphans its children and frees it.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<Object3D> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.remove(parent, id)?;
        }
        let node = self.nodes.remove(id).ok_or(CsmError::NodeNotFound(id))?;
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(*child) {
                child.parent = None;
            }
        }
        Ok(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Object3D> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Object3D> {
        self.nodes.get_mut(id)
    }

    fn get(&self, id: NodeId) -> Result<&Object3D> {
        self.nodes.get(id).ok_or(CsmError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Object3D> {
        self.nodes.get_mut(id).ok_or(CsmError::NodeNotFound(id))
    }

    /// Makes `child` a child of `parent`, detaching it from any previous parent.
    ///
    /// The child keeps its local transform, so its world transform changes.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        let previous = self.get(child)?.parent;
        if self.is_ancestor_or_self(child, parent) {
            return Err(CsmError::CyclicHierarchy { parent, child });
        }
        if let Some(previous) = previous {
            self.remove(previous, child)?;
        }
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let children = &mut self.get_mut(parent)?.children;
        let position = children
            .iter()
            .position(|id| *id == child)
            .ok_or(CsmError::NotAChild { parent, child })?;
        children.remove(position);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        Ok(())
    }

    /// Re-parents `child` under `parent` while preserving its world transform.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.update_world_matrix(parent, true, false)?;
        let mut to_parent_space = self.get(parent)?.world_matrix.inverse();

        if let Some(previous) = self.get(child)?.parent {
            self.update_world_matrix(previous, true, false)?;
            to_parent_space *= self.get(previous)?.world_matrix;
        }

        self.apply_matrix4(child, to_parent_space)?;
        self.add(parent, child)?;
        self.update_world_matrix(child, false, true)
    }

    /// Pre-multiplies the node's local transform by `matrix`.
    pub fn apply_matrix4(&mut self, id: NodeId, matrix: Mat4) -> Result<()> {
        let node = self.get_mut(id)?;
        node.update_matrix();
        node.matrix = matrix * node.matrix;
        let (scale, rotation, position) = node.matrix.to_scale_rotation_translation();
        node.scale = scale;
        node.rotation = rotation;
        node.position = position;
        Ok(())
    }

    /// Rotates the node so its local -Z axis faces the world-space `target`.
    pub fn look_at(&mut self, id: NodeId, target: Vec3, up: Vec3) -> Result<()> {
        self.update_world_matrix(id, true, false)?;
        let node = self.get(id)?;
        let eye = node.world_position();
        let mut rotation = look_at_quat(eye, target, up);

        if let Some(parent) = node.parent {
            let (_, parent_rotation, _) = self.get(parent)?.world_matrix.to_scale_rotation_translation();
            rotation = parent_rotation.inverse() * rotation;
        }
        self.get_mut(id)?.rotation = rotation;
        Ok(())
    }

    /// Refreshes the node and all of its descendants.
    pub fn update_matrix_world(&mut self, id: NodeId) -> Result<()> {
        self.update_world_matrix(id, false, true)
    }

    pub fn update_world_matrix(
        &mut self,
        id: NodeId,
        update_parents: bool,
        update_children: bool,
    ) -> Result<()> {
        let parent = self.get(id)?.parent;
        if update_parents {
            if let Some(parent) = parent {
                self.update_world_matrix(parent, true, false)?;
            }
        }

        let parent_world = parent.and_then(|p| self.nodes.get(p)).map(|p| p.world_matrix);
        let node = self.get_mut(id)?;
        node.update_matrix();
        node.world_matrix = match parent_world {
            Some(parent_world) => parent_world * node.matrix,
            None => node.matrix,
        };

        if update_children {
            let children = node.children.clone();
            for child in children {
                self.update_world_matrix(child, false, true)?;
            }
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.nodes.get(id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}
