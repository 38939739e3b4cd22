use std::{collections::BTreeMap, sync::Arc};

use glam::{Mat4, Vec2, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::csm::shader_chunks::ShaderChunks;

/// Material shared between the application and the shadow controller.
pub type SharedMaterial = Arc<RwLock<Material>>;

/// Value bound to a named shader uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Mat4(Mat4),
    Vec2Array(Vec<Vec2>),
}

impl UniformValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec2_array(&self) -> Option<&[Vec2]> {
        match self {
            Self::Vec2Array(values) => Some(values),
            _ => None,
        }
    }
}

/// Renderer-facing material state: preprocessor defines, uniforms and an
/// optional set of lighting chunk overrides.
///
/// Setting `needs_update` asks the renderer to recompile the program.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: String,
    pub defines: BTreeMap<String, String>,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub needs_update: bool,
    pub shader_chunks: Option<Arc<ShaderChunks>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedMaterial {
        Arc::new(RwLock::new(self))
    }

    pub fn has_define(&self, key: &str) -> bool {
        self.defines.contains_key(key)
    }

    pub fn define(&self, key: &str) -> Option<&str> {
        self.defines.get(key).map(String::as_str)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    /// Source for a named shader chunk, preferring this material's overrides.
    pub fn resolve_chunk<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.shader_chunks
            .as_deref()
            .and_then(|chunks| chunks.get(name))
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_chunk_falls_back_without_override() {
        let mut material = Material::new("ground");
        assert_eq!(material.resolve_chunk("light_frag", "builtin"), "builtin");

        material.shader_chunks = Some(Arc::new(ShaderChunks::cascaded()));
        let source = material.resolve_chunk("light_frag", "builtin");
        assert!(source.contains("CSM_cascades"));
        assert_eq!(material.resolve_chunk("fog_frag", "builtin"), "builtin");
    }
}
