//! Per-kind descriptor structs.
//!
//! Field order is the key order: the display name comes first, then the
//! parameters in declaration order, then nested descriptors. `derive(Ord)`
//! relies on that.

use serde::Serialize;

use super::{
    MaterialDescriptor,
    values::{ParamSlot, Rgb, Scalar, read_bool, read_f32, read_i32, read_rgb, read_scalar},
};
use crate::host::{EvalTime, HostMaterial};

/// Microfacet distribution for glossy and glass lobes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Distribution {
    Sharp,
    Beckmann,
    #[default]
    Ggx,
    AshikhminShirley,
    MultiscatterGgx,
}

impl Distribution {
    pub fn from_host_index(v: i32) -> Self {
        match v {
            0 => Distribution::Sharp,
            1 => Distribution::Beckmann,
            3 => Distribution::AshikhminShirley,
            4 => Distribution::MultiscatterGgx,
            _ => Distribution::Ggx,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Distribution::Sharp => "sharp",
            Distribution::Beckmann => "beckmann",
            Distribution::Ggx => "ggx",
            Distribution::AshikhminShirley => "ashikhmin_shirley",
            Distribution::MultiscatterGgx => "multiscatter_ggx",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NormalSpace {
    #[default]
    Tangent,
    Object,
    World,
}

impl NormalSpace {
    pub fn from_host_index(v: i32) -> Self {
        match v {
            1 => NormalSpace::Object,
            2 => NormalSpace::World,
            _ => NormalSpace::Tangent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NormalSpace::Tangent => "tangent",
            NormalSpace::Object => "object",
            NormalSpace::World => "world",
        }
    }
}

/// Optional normal mapping shared by every surface kind that takes a normal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NormalMapDescriptor {
    pub space: NormalSpace,
    pub strength: ParamSlot<Scalar>,
    pub color: ParamSlot<Rgb>,
    pub invert_green: bool,
}

impl NormalMapDescriptor {
    pub const FLAT: [f32; 3] = [0.5, 0.5, 1.0];

    /// Present when the host enables normal mapping or binds a normal map.
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Option<Self> {
        let bound = mat.texture("normal_color").is_some();
        if !bound && !read_bool(mat, "normal_enabled", time, false) {
            return None;
        }
        Some(Self {
            space: NormalSpace::from_host_index(read_i32(mat, "normal_space", time, 0)),
            strength: read_scalar(mat, "normal_strength", time, 1.0),
            color: read_rgb(mat, "normal_color", time, Self::FLAT),
            invert_green: read_bool(mat, "normal_invert_green", time, false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DiffuseDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub roughness: ParamSlot<Scalar>,
    pub normal: Option<NormalMapDescriptor>,
}

impl DiffuseDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.8, 0.8, 0.8]),
            roughness: read_scalar(mat, "roughness", time, 0.0),
            normal: NormalMapDescriptor::read(mat, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GlossyDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub roughness: ParamSlot<Scalar>,
    pub distribution: Distribution,
    pub normal: Option<NormalMapDescriptor>,
}

impl GlossyDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.8, 0.8, 0.8]),
            roughness: read_scalar(mat, "roughness", time, 0.2),
            distribution: Distribution::from_host_index(read_i32(mat, "distribution", time, 2)),
            normal: NormalMapDescriptor::read(mat, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GlassDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub roughness: ParamSlot<Scalar>,
    pub ior: ParamSlot<Scalar>,
    pub distribution: Distribution,
    pub normal: Option<NormalMapDescriptor>,
}

impl GlassDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [1.0, 1.0, 1.0]),
            roughness: read_scalar(mat, "roughness", time, 0.0),
            ior: read_scalar(mat, "ior", time, 1.45),
            distribution: Distribution::from_host_index(read_i32(mat, "distribution", time, 2)),
            normal: NormalMapDescriptor::read(mat, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EmissionDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub strength: ParamSlot<Scalar>,
}

impl EmissionDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [1.0, 1.0, 1.0]),
            strength: read_scalar(mat, "strength", time, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TransparentDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
}

impl TransparentDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [1.0, 1.0, 1.0]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TranslucentDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub normal: Option<NormalMapDescriptor>,
}

impl TranslucentDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.8, 0.8, 0.8]),
            normal: NormalMapDescriptor::read(mat, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PrincipledDescriptor {
    pub name: String,
    pub base_color: ParamSlot<Rgb>,
    pub metallic: ParamSlot<Scalar>,
    pub roughness: ParamSlot<Scalar>,
    pub specular: ParamSlot<Scalar>,
    pub ior: ParamSlot<Scalar>,
    pub transmission: ParamSlot<Scalar>,
    pub emission_color: ParamSlot<Rgb>,
    pub emission_strength: ParamSlot<Scalar>,
    pub alpha: ParamSlot<Scalar>,
    pub normal: Option<NormalMapDescriptor>,
}

impl PrincipledDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            base_color: read_rgb(mat, "base_color", time, [0.8, 0.8, 0.8]),
            metallic: read_scalar(mat, "metallic", time, 0.0),
            roughness: read_scalar(mat, "roughness", time, 0.5),
            specular: read_scalar(mat, "specular", time, 0.5),
            ior: read_scalar(mat, "ior", time, 1.45),
            transmission: read_scalar(mat, "transmission", time, 0.0),
            emission_color: read_rgb(mat, "emission_color", time, [0.0, 0.0, 0.0]),
            emission_strength: read_scalar(mat, "emission_strength", time, 0.0),
            alpha: read_scalar(mat, "alpha", time, 1.0),
            normal: NormalMapDescriptor::read(mat, time),
        }
    }
}

/// Holdout has no parameters, so every holdout material shares one descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct HoldoutDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VolumeAbsorptionDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub density: Scalar,
}

impl VolumeAbsorptionDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.8, 0.8, 0.8]),
            density: read_f32(mat, "density", time, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VolumeScatterDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub density: Scalar,
    pub anisotropy: Scalar,
}

impl VolumeScatterDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.8, 0.8, 0.8]),
            density: read_f32(mat, "density", time, 1.0),
            anisotropy: read_f32(mat, "anisotropy", time, 0.0),
        }
    }
}

/// `a + b`. Operands are nested descriptors; an empty host slot stays `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AddDescriptor {
    pub name: String,
    pub a: Option<Box<MaterialDescriptor>>,
    pub b: Option<Box<MaterialDescriptor>>,
}

/// `mix(a, b, fac)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MixDescriptor {
    pub name: String,
    pub fac: ParamSlot<Scalar>,
    pub a: Option<Box<MaterialDescriptor>>,
    pub b: Option<Box<MaterialDescriptor>>,
}

/// Per-face container. Never becomes a shader of its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MultiDescriptor {
    pub name: String,
    pub slots: Vec<Option<MaterialDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BackgroundDescriptor {
    pub name: String,
    pub color: ParamSlot<Rgb>,
    pub strength: ParamSlot<Scalar>,
}

impl BackgroundDescriptor {
    pub fn read(mat: &dyn HostMaterial, time: EvalTime) -> Self {
        Self {
            name: mat.name().to_string(),
            color: read_rgb(mat, "color", time, [0.05, 0.05, 0.05]),
            strength: read_scalar(mat, "strength", time, 1.0),
        }
    }
}

/// Graph-authored material. `graph` is the encoded graph text; empty means "no graph".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NodeGraphDescriptor {
    pub name: String,
    pub graph: String,
}

impl NodeGraphDescriptor {
    pub fn read(mat: &dyn HostMaterial) -> Self {
        Self {
            name: mat.name().to_string(),
            graph: mat.graph_text().unwrap_or_default(),
        }
    }
}

/// Stand-in for anything the translator cannot express. One per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PlaceholderDescriptor;
