//! Core type definitions for the renderer-native node model.

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::Serialize;

/// Index of a node inside one [`ShaderGraph`](super::graph::ShaderGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Index of a shader inside a [`RenderScene`](super::scene::RenderScene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ShaderIndex(pub usize);

impl fmt::Display for ShaderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Renderer-native node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeType {
    Output,
    DiffuseBsdf,
    GlossyBsdf,
    GlassBsdf,
    PrincipledBsdf,
    Emission,
    TransparentBsdf,
    TranslucentBsdf,
    Holdout,
    AbsorptionVolume,
    ScatterVolume,
    AddClosure,
    MixClosure,
    Background,
    ImageTexture,
    NormalMap,
    SeparateRgb,
    CombineRgb,
    Invert,
    Value,
    Rgb,
    Math,
    MixRgb,
    TextureCoordinate,
}

impl NodeType {
    const ALL: [NodeType; 24] = [
        NodeType::Output,
        NodeType::DiffuseBsdf,
        NodeType::GlossyBsdf,
        NodeType::GlassBsdf,
        NodeType::PrincipledBsdf,
        NodeType::Emission,
        NodeType::TransparentBsdf,
        NodeType::TranslucentBsdf,
        NodeType::Holdout,
        NodeType::AbsorptionVolume,
        NodeType::ScatterVolume,
        NodeType::AddClosure,
        NodeType::MixClosure,
        NodeType::Background,
        NodeType::ImageTexture,
        NodeType::NormalMap,
        NodeType::SeparateRgb,
        NodeType::CombineRgb,
        NodeType::Invert,
        NodeType::Value,
        NodeType::Rgb,
        NodeType::Math,
        NodeType::MixRgb,
        NodeType::TextureCoordinate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Output => "Output",
            NodeType::DiffuseBsdf => "DiffuseBsdf",
            NodeType::GlossyBsdf => "GlossyBsdf",
            NodeType::GlassBsdf => "GlassBsdf",
            NodeType::PrincipledBsdf => "PrincipledBsdf",
            NodeType::Emission => "Emission",
            NodeType::TransparentBsdf => "TransparentBsdf",
            NodeType::TranslucentBsdf => "TranslucentBsdf",
            NodeType::Holdout => "Holdout",
            NodeType::AbsorptionVolume => "AbsorptionVolume",
            NodeType::ScatterVolume => "ScatterVolume",
            NodeType::AddClosure => "AddClosure",
            NodeType::MixClosure => "MixClosure",
            NodeType::Background => "Background",
            NodeType::ImageTexture => "ImageTexture",
            NodeType::NormalMap => "NormalMap",
            NodeType::SeparateRgb => "SeparateRgb",
            NodeType::CombineRgb => "CombineRgb",
            NodeType::Invert => "Invert",
            NodeType::Value => "Value",
            NodeType::Rgb => "Rgb",
            NodeType::Math => "Math",
            NodeType::MixRgb => "MixRgb",
            NodeType::TextureCoordinate => "TextureCoordinate",
        }
    }

    /// Name of the output socket that carries this node's principal result.
    pub fn principal_output(self) -> &'static str {
        match self {
            NodeType::DiffuseBsdf
            | NodeType::GlossyBsdf
            | NodeType::GlassBsdf
            | NodeType::PrincipledBsdf
            | NodeType::TransparentBsdf
            | NodeType::TranslucentBsdf => sockets::BSDF,
            NodeType::Emission => sockets::EMISSION,
            NodeType::Holdout => sockets::HOLDOUT,
            NodeType::AbsorptionVolume | NodeType::ScatterVolume => sockets::VOLUME,
            NodeType::AddClosure | NodeType::MixClosure => sockets::CLOSURE,
            NodeType::Background => sockets::BACKGROUND,
            NodeType::NormalMap => sockets::NORMAL,
            NodeType::Value | NodeType::Math => sockets::VALUE,
            NodeType::TextureCoordinate => sockets::UV,
            NodeType::ImageTexture
            | NodeType::CombineRgb
            | NodeType::Invert
            | NodeType::Rgb
            | NodeType::MixRgb
            | NodeType::SeparateRgb
            | NodeType::Output => sockets::COLOR,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow!("unsupported node type: {s}"))
    }
}

/// Socket names shared by the assembly routines.
pub mod sockets {
    pub const SURFACE: &str = "surface";
    pub const VOLUME: &str = "volume";
    pub const BSDF: &str = "bsdf";
    pub const EMISSION: &str = "emission";
    pub const HOLDOUT: &str = "holdout";
    pub const CLOSURE: &str = "closure";
    pub const CLOSURE1: &str = "closure1";
    pub const CLOSURE2: &str = "closure2";
    pub const BACKGROUND: &str = "background";
    pub const COLOR: &str = "color";
    pub const VALUE: &str = "value";
    pub const UV: &str = "uv";
    pub const FAC: &str = "fac";
    pub const NORMAL: &str = "normal";
    pub const STRENGTH: &str = "strength";
    pub const SPACE: &str = "space";
    pub const ROUGHNESS: &str = "roughness";
    pub const DISTRIBUTION: &str = "distribution";
    pub const IOR: &str = "ior";
    pub const DENSITY: &str = "density";
    pub const ANISOTROPY: &str = "anisotropy";
    pub const BASE_COLOR: &str = "base_color";
    pub const METALLIC: &str = "metallic";
    pub const SPECULAR: &str = "specular";
    pub const TRANSMISSION: &str = "transmission";
    pub const EMISSION_COLOR: &str = "emission_color";
    pub const EMISSION_STRENGTH: &str = "emission_strength";
    pub const ALPHA: &str = "alpha";
    pub const IMAGE: &str = "image";
    pub const FILENAME: &str = "filename";
    pub const R: &str = "r";
    pub const G: &str = "g";
    pub const B: &str = "b";
}

/// Constant value bound to a node input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SocketValue {
    Float(f32),
    Color([f32; 3]),
    Vector([f32; 3]),
    Int(i32),
    Bool(bool),
    Text(String),
}
