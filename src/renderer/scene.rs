//! The renderer scene: owns every appended shader and image resource.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{
    graph::ShaderGraph,
    types::{NodeType, ShaderIndex, SocketValue, sockets},
};
use crate::host::TextureHandle;

#[derive(Debug, Clone, Serialize)]
pub struct Shader {
    pub name: String,
    pub graph: ShaderGraph,
}

impl Shader {
    pub fn new(name: impl Into<String>, graph: ShaderGraph) -> Self {
        Self {
            name: name.into(),
            graph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageResource {
    pub texture_id: u64,
    pub path: String,
}

/// Shaders and images of one translation pass.
///
/// Once appended, a shader is addressed only by its [`ShaderIndex`]. Slot 0
/// is the background shader and exists from construction.
#[derive(Debug, Clone, Serialize)]
pub struct RenderScene {
    shaders: Vec<Shader>,
    images: Vec<ImageResource>,
}

impl Default for RenderScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScene {
    pub const BACKGROUND: ShaderIndex = ShaderIndex(0);

    pub fn new() -> Self {
        Self {
            shaders: vec![default_background()],
            images: Vec::new(),
        }
    }

    pub fn add_shader(&mut self, shader: Shader) -> ShaderIndex {
        let index = ShaderIndex(self.shaders.len());
        self.shaders.push(shader);
        index
    }

    /// Overwrite the well-known background slot.
    pub fn set_background(&mut self, shader: Shader) -> ShaderIndex {
        self.shaders[Self::BACKGROUND.0] = shader;
        Self::BACKGROUND
    }

    pub fn shader(&self, index: ShaderIndex) -> Option<&Shader> {
        self.shaders.get(index.0)
    }

    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Register an image and return its slot. Callers are expected to memoize.
    pub fn add_image(&mut self, texture: &TextureHandle) -> usize {
        self.images.push(ImageResource {
            texture_id: texture.id,
            path: texture.path.clone(),
        });
        self.images.len() - 1
    }

    pub fn images(&self) -> &[ImageResource] {
        &self.images
    }

    /// Pretty JSON of every shader graph and image, for inspection or a renderer process.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize render scene")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

fn default_background() -> Shader {
    let mut graph = ShaderGraph::new();
    let bg = graph.add(NodeType::Background, "background");
    graph.set_input(bg, sockets::COLOR, SocketValue::Color([0.05, 0.05, 0.05]));
    graph.set_input(bg, sockets::STRENGTH, SocketValue::Float(1.0));
    let out = graph.output();
    graph.connect(bg, sockets::BACKGROUND, out, sockets::SURFACE);
    Shader::new("background", graph)
}
