//! Host-side material capability interface.
//!
//! The translator never owns host materials. It borrows a `&dyn HostMaterial`
//! for the duration of one resolution call, reads every parameter it needs
//! into a descriptor, and lets go.

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Host evaluation time (ticks). Threaded through unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EvalTime(pub i64);

/// Reference to a host texture map.
///
/// `id` is the host's identity for the map; two handles with the same id
/// always describe the same image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextureHandle {
    pub id: u64,
    pub path: String,
}

impl TextureHandle {
    pub fn new(id: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// A constant parameter value as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Color([f32; 3]),
}

impl ParamValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            ParamValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            ParamValue::Color(_) => None,
        }
    }

    /// Scalars splat to grey so a float-typed host parameter can drive a color input.
    pub fn as_rgb(&self) -> Option<[f32; 3]> {
        match self {
            ParamValue::Color(c) => Some(*c),
            other => other.as_f32().map(|v| [v, v, v]),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.is_finite() => Some(v.floor() as i32),
            ParamValue::Bool(v) => Some(i32::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            ParamValue::Int(v) => Some(*v != 0),
            ParamValue::Float(v) => Some(*v != 0.0),
            ParamValue::Color(_) => None,
        }
    }
}

/// Capability interface every host material exposes to the translator.
pub trait HostMaterial {
    /// Host class name, e.g. `"Diffuse"`. Mapped through [`MaterialKind::from_class_name`].
    fn class_name(&self) -> &str;

    /// Display name. Part of every named descriptor.
    fn name(&self) -> &str;

    /// Constant value of `param` at `time`, or `None` when the host has no such parameter.
    fn value(&self, param: &str, time: EvalTime) -> Option<ParamValue>;

    /// Texture bound to `param`. Absent when unset or disabled.
    fn texture(&self, param: &str) -> Option<TextureHandle>;

    fn sub_material_count(&self) -> usize {
        0
    }

    /// Sub-material in `slot`; `None` for an empty slot.
    fn sub_material(&self, _slot: usize) -> Option<&dyn HostMaterial> {
        None
    }

    /// Encoded node graph for graph-authored materials.
    fn graph_text(&self) -> Option<String> {
        None
    }
}

/// The fixed set of appearance models the translator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Diffuse,
    Glossy,
    Glass,
    Emission,
    Transparent,
    Translucent,
    Principled,
    Holdout,
    VolumeAbsorption,
    VolumeScatter,
    Add,
    Mix,
    Multi,
    Background,
    NodeGraph,
    Placeholder,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 16] = [
        MaterialKind::Diffuse,
        MaterialKind::Glossy,
        MaterialKind::Glass,
        MaterialKind::Emission,
        MaterialKind::Transparent,
        MaterialKind::Translucent,
        MaterialKind::Principled,
        MaterialKind::Holdout,
        MaterialKind::VolumeAbsorption,
        MaterialKind::VolumeScatter,
        MaterialKind::Add,
        MaterialKind::Mix,
        MaterialKind::Multi,
        MaterialKind::Background,
        MaterialKind::NodeGraph,
        MaterialKind::Placeholder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::Diffuse => "Diffuse",
            MaterialKind::Glossy => "Glossy",
            MaterialKind::Glass => "Glass",
            MaterialKind::Emission => "Emission",
            MaterialKind::Transparent => "Transparent",
            MaterialKind::Translucent => "Translucent",
            MaterialKind::Principled => "Principled",
            MaterialKind::Holdout => "Holdout",
            MaterialKind::VolumeAbsorption => "VolumeAbsorption",
            MaterialKind::VolumeScatter => "VolumeScatter",
            MaterialKind::Add => "Add",
            MaterialKind::Mix => "Mix",
            MaterialKind::Multi => "Multi",
            MaterialKind::Background => "Background",
            MaterialKind::NodeGraph => "NodeGraph",
            MaterialKind::Placeholder => "Placeholder",
        }
    }

    /// Host classes the translator supports. The placeholder is internal and never matches.
    pub fn from_class_name(class_name: &str) -> Option<MaterialKind> {
        MaterialKind::ALL
            .into_iter()
            .filter(|k| *k != MaterialKind::Placeholder)
            .find(|k| k.as_str() == class_name)
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        MaterialKind::from_class_name(s).ok_or_else(|| anyhow!("unsupported material class: {s}"))
    }
}
