//! Shader cache and builder.
//!
//! A [`TranslationSession`] owns the render scene being produced and one
//! cache per material kind. Resolving a host material snapshots it into a
//! descriptor and returns the index of the shader built for that descriptor,
//! building it on first sight. Nothing here ever returns an error to the
//! caller: every failure is logged and resolves to the placeholder shader.

mod caches;
mod kind_cache;

use std::collections::BTreeMap;

use anyhow::Result;

pub use caches::ShaderCaches;
pub use kind_cache::KindCache;

use crate::{
    assembly::{assemble_shader, placeholder_shader},
    descriptor::{MaterialDescriptor, MultiDescriptor, PlaceholderDescriptor, describe},
    host::{EvalTime, HostMaterial, MaterialKind},
    renderer::{RenderScene, Shader, ShaderIndex, TextureNodeCache, TextureNodeSource},
};

/// Result of resolving one host material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMaterial {
    Shader(ShaderIndex),
    /// Multi materials: sub-material slot -> shader.
    PerSlot(BTreeMap<usize, ShaderIndex>),
}

impl ResolvedMaterial {
    pub fn shader(&self) -> Option<ShaderIndex> {
        match self {
            ResolvedMaterial::Shader(s) => Some(*s),
            ResolvedMaterial::PerSlot(_) => None,
        }
    }
}

/// One translation pass at a fixed evaluation time.
pub struct TranslationSession {
    time: EvalTime,
    scene: RenderScene,
    textures: Box<dyn TextureNodeSource>,
    caches: ShaderCaches,
    builds: usize,
}

impl TranslationSession {
    pub fn new(time: EvalTime) -> Self {
        Self::with_texture_source(time, Box::new(TextureNodeCache::new()))
    }

    pub fn with_texture_source(time: EvalTime, textures: Box<dyn TextureNodeSource>) -> Self {
        Self {
            time,
            scene: RenderScene::new(),
            textures,
            caches: ShaderCaches::default(),
            builds: 0,
        }
    }

    pub fn time(&self) -> EvalTime {
        self.time
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    pub fn into_scene(self) -> RenderScene {
        self.scene
    }

    /// Distinct descriptors remembered for `kind`.
    pub fn cache_len(&self, kind: MaterialKind) -> usize {
        self.caches.len(kind)
    }

    /// Shaders appended to the scene so far (background overwrites excluded).
    pub fn builds(&self) -> usize {
        self.builds
    }

    /// Snapshot `mat` at the session time and resolve it.
    pub fn resolve(&mut self, mat: &dyn HostMaterial) -> ResolvedMaterial {
        let desc = describe(mat, self.time);
        self.resolve_descriptor(&desc)
    }

    pub fn resolve_descriptor(&mut self, desc: &MaterialDescriptor) -> ResolvedMaterial {
        match desc {
            MaterialDescriptor::Multi(multi) => ResolvedMaterial::PerSlot(self.resolve_multi(multi)),
            MaterialDescriptor::Background(_) => ResolvedMaterial::Shader(self.apply_background(desc)),
            other => ResolvedMaterial::Shader(self.get_or_build(other)),
        }
    }

    fn resolve_multi(&mut self, multi: &MultiDescriptor) -> BTreeMap<usize, ShaderIndex> {
        let mut out = BTreeMap::new();
        for (slot, sub) in multi.slots.iter().enumerate() {
            let index = match sub {
                None => self.placeholder(),
                Some(MaterialDescriptor::Multi(inner)) => {
                    log::warn!(
                        "[cache] multi '{}' slot {slot} holds multi '{}'; using placeholder",
                        multi.name,
                        inner.name
                    );
                    self.placeholder()
                }
                Some(MaterialDescriptor::Background(_)) => {
                    log::warn!(
                        "[cache] multi '{}' slot {slot} holds a background; using placeholder",
                        multi.name
                    );
                    self.placeholder()
                }
                Some(d) => self.get_or_build(d),
            };
            out.insert(slot, index);
        }
        out
    }

    /// Index of the shader for `desc`, building it at most once per session.
    pub fn get_or_build(&mut self, desc: &MaterialDescriptor) -> ShaderIndex {
        if let Some(index) = self.caches.lookup(desc) {
            log::trace!("[cache] hit {} '{}' -> {index}", desc.kind(), desc.display_name());
            return index;
        }

        match desc {
            MaterialDescriptor::Placeholder(_) => return self.placeholder(),
            MaterialDescriptor::Multi(m) => {
                log::warn!("[cache] multi '{}' has no shader of its own; using placeholder", m.name);
                return self.placeholder();
            }
            MaterialDescriptor::Background(_) => return self.apply_background(desc),
            MaterialDescriptor::NodeGraph(g) if g.graph.is_empty() => {
                log::debug!("[cache] node graph '{}' is empty; using placeholder", g.name);
                let index = self.placeholder();
                return self.caches.store(desc.clone(), index);
            }
            _ => {}
        }

        let index = match self.build(desc) {
            Ok(index) => {
                log::debug!(
                    "[cache] built {} '{}' -> {index}",
                    desc.kind(),
                    desc.display_name()
                );
                index
            }
            Err(e) => {
                log::warn!(
                    "[cache] failed to build {} '{}', using placeholder: {e:#}",
                    desc.kind(),
                    desc.display_name()
                );
                self.placeholder()
            }
        };
        self.caches.store(desc.clone(), index)
    }

    fn build(&mut self, desc: &MaterialDescriptor) -> Result<ShaderIndex> {
        let shader = assemble_shader(desc, &mut self.scene, self.textures.as_mut())?;
        Ok(self.push(shader))
    }

    fn push(&mut self, shader: Shader) -> ShaderIndex {
        self.builds += 1;
        self.scene.add_shader(shader)
    }

    /// The session's flat-black fallback shader, built on first use.
    pub fn placeholder(&mut self) -> ShaderIndex {
        if let Some(index) = self.caches.placeholder.get(&PlaceholderDescriptor) {
            return index;
        }
        let shader = placeholder_shader(&mut self.scene, self.textures.as_mut());
        let index = self.push(shader);
        log::debug!("[cache] built placeholder -> {index}");
        self.caches.placeholder.insert(PlaceholderDescriptor, index)
    }

    /// Overwrite the scene's background slot with `desc`.
    ///
    /// Background shaders are not cached; the latest one applied wins.
    pub fn apply_background(&mut self, desc: &MaterialDescriptor) -> ShaderIndex {
        match assemble_shader(desc, &mut self.scene, self.textures.as_mut()) {
            Ok(shader) => {
                log::debug!("[cache] background set from '{}'", desc.display_name());
                self.scene.set_background(shader)
            }
            Err(e) => {
                log::warn!(
                    "[cache] failed to build background '{}', keeping previous: {e:#}",
                    desc.display_name()
                );
                RenderScene::BACKGROUND
            }
        }
    }
}
