//! Cascade-aware lighting chunks.
//!
//! Each controller owns one [`ShaderChunks`] and hands it to the materials it
//! configures, so the renderer picks the chunk per material instead of from a
//! process-wide table. Two controllers never overwrite each other's chunks.

use std::collections::BTreeMap;

/// Name of the fragment chunk that declares lighting uniforms.
pub const LIGHT_PARS_FRAG: &str = "light_pars_frag";

/// Name of the fragment chunk that accumulates direct lighting.
pub const LIGHT_FRAG: &str = "light_frag";

const CSM_LIGHT_PARS_FRAG: &str = r#"
#ifdef USE_CSM
    uniform vec2 CSM_cascades[CSM_CASCADES];
    uniform float cameraNear;
    uniform float shadowFar;
    uniform bool CSM_debug;

    const vec3 CSM_DEBUG_COLORS[4] = vec3[4](
        vec3(1.0, 0.25, 0.25),
        vec3(0.25, 1.0, 0.25),
        vec3(0.25, 0.25, 1.0),
        vec3(1.0, 1.0, 0.25)
    );

    float csmLinearDepth(float viewDepth) {
        return (viewDepth - cameraNear) / (shadowFar - cameraNear);
    }
#endif
"#;

const CSM_LIGHT_FRAG: &str = r#"
#if defined(USE_CSM) && NUM_DIR_LIGHTS > 0
    float csmDepth = csmLinearDepth(-vViewPosition.z);
    vec3 csmTint = vec3(1.0);

    #ifdef CSM_FADE
        float csmMargin = 0.0;
    #endif

    for (int i = 0; i < NUM_DIR_LIGHTS; i++) {
        DirectionalLight light = directionalLights[i];
        vec2 cascade = CSM_cascades[i];

        #ifdef CSM_FADE
            csmMargin = 0.25 * pow(cascade.y, 2.0) * (cascade.y - cascade.x);
            float csmStart = cascade.x - csmMargin * 0.5;
            float csmEnd = cascade.y + csmMargin * 0.5;
            float csmInside = step(csmStart, csmDepth) * step(csmDepth, csmEnd);
            float csmBlend = i + 1 < CSM_CASCADES
                ? 1.0 - smoothstep(cascade.y - csmMargin * 0.5, csmEnd, csmDepth)
                : 1.0;
            float csmWeight = csmInside * csmBlend;
        #else
            float csmWeight = step(cascade.x, csmDepth) * (1.0 - step(cascade.y, csmDepth));
        #endif

        if (csmWeight > 0.0) {
            float shadow = getDirectionalShadow(i, vDirectionalShadowCoord[i]);
            irradiance += light.color * saturate(dot(geometryNormal, -light.direction)) * mix(1.0, shadow, csmWeight);
            if (CSM_debug) {
                csmTint = CSM_DEBUG_COLORS[i % 4];
            }
        }
    }

    irradiance *= csmTint;
#else
    #include <light_frag_default>
#endif
"#;

/// Named GLSL chunk sources that override a renderer's built-ins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderChunks {
    chunks: BTreeMap<String, String>,
}

impl ShaderChunks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cascade-aware `light_pars_frag` and `light_frag` pair.
    pub fn cascaded() -> Self {
        let mut chunks = Self::new();
        chunks.insert(LIGHT_PARS_FRAG, CSM_LIGHT_PARS_FRAG);
        chunks.insert(LIGHT_FRAG, CSM_LIGHT_FRAG);
        chunks
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.chunks.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.chunks.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.chunks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascaded_set_overrides_both_lighting_chunks() {
        let chunks = ShaderChunks::cascaded();
        let names: Vec<_> = chunks.names().collect();
        assert_eq!(names, vec![LIGHT_FRAG, LIGHT_PARS_FRAG]);

        let pars = chunks.get(LIGHT_PARS_FRAG).unwrap();
        for uniform in ["CSM_cascades", "cameraNear", "shadowFar", "CSM_debug"] {
            assert!(pars.contains(uniform), "missing {uniform}");
        }
        assert!(chunks.get(LIGHT_FRAG).unwrap().contains("CSM_FADE"));
    }
}
