//! Host material graph -> renderer shader-node graph translation.
//!
//! - [`descriptor`]: comparable snapshots of host materials
//! - [`builder`]: per-kind shader caches and the translation session
//! - [`assembly`]: descriptor -> renderer nodes
//! - [`editor`]: background node-graph editor bridge
//! - [`library`]: JSON material library used as a stand-alone host

pub mod assembly;
pub mod builder;
pub mod config;
pub mod descriptor;
pub mod editor;
pub mod graph;
pub mod graph_codec;
pub mod host;
pub mod library;
pub mod persist;
pub mod protocol;
pub mod renderer;

pub use builder::{ResolvedMaterial, TranslationSession};
pub use config::SessionConfig;
pub use descriptor::{MaterialDescriptor, describe};
pub use host::{EvalTime, HostMaterial, MaterialKind, ParamValue, TextureHandle};
pub use renderer::{RenderScene, ShaderIndex};
