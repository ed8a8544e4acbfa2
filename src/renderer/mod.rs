//! Renderer-side model the translator produces.
//!
//! This module is organized into several submodules:
//! - `types`: node types, socket names, constant socket values, indices
//! - `graph`: `ShaderGraph`, the per-shader node graph
//! - `scene`: `RenderScene`, which owns appended shaders and images
//! - `texture_cache`: texture reference -> reusable texture node
//!
//! Everything here is addressed by index once created: nodes by `NodeId`,
//! shaders by `ShaderIndex`.

pub mod graph;
pub mod scene;
pub mod texture_cache;
pub mod types;

pub use graph::{Link, ShaderGraph, ShaderNode};
pub use scene::{ImageResource, RenderScene, Shader};
pub use texture_cache::{TextureNodeCache, TextureNodeSource};
pub use types::{NodeId, NodeType, ShaderIndex, SocketValue, sockets};
