//! Material descriptors: immutable, totally ordered snapshots of a host
//! material's visible parameters at one evaluation time.
//!
//! Descriptors are built fresh on every resolution request and serve only as
//! cache keys. Two materials whose descriptors compare equal translate to the
//! same renderer shader.

pub mod kinds;
pub mod values;

use serde::Serialize;

use crate::host::{EvalTime, HostMaterial, MaterialKind};

pub use kinds::*;
pub use values::{ParamSlot, Rgb, Scalar};

/// How deep container and combination materials may nest before the
/// remainder is replaced by the placeholder. Guards against cyclic host graphs.
pub const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MaterialDescriptor {
    Diffuse(DiffuseDescriptor),
    Glossy(GlossyDescriptor),
    Glass(GlassDescriptor),
    Emission(EmissionDescriptor),
    Transparent(TransparentDescriptor),
    Translucent(TranslucentDescriptor),
    Principled(PrincipledDescriptor),
    Holdout(HoldoutDescriptor),
    VolumeAbsorption(VolumeAbsorptionDescriptor),
    VolumeScatter(VolumeScatterDescriptor),
    Add(AddDescriptor),
    Mix(MixDescriptor),
    Multi(MultiDescriptor),
    Background(BackgroundDescriptor),
    NodeGraph(NodeGraphDescriptor),
    Placeholder(PlaceholderDescriptor),
}

/// Which output terminal a material's principal closure feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClosureClass {
    Surface,
    Volume,
    /// Resolves to other shaders, not a closure.
    Container,
    /// Wires its own terminals (background, freeform graphs).
    Special,
}

impl MaterialDescriptor {
    pub fn kind(&self) -> MaterialKind {
        match self {
            MaterialDescriptor::Diffuse(_) => MaterialKind::Diffuse,
            MaterialDescriptor::Glossy(_) => MaterialKind::Glossy,
            MaterialDescriptor::Glass(_) => MaterialKind::Glass,
            MaterialDescriptor::Emission(_) => MaterialKind::Emission,
            MaterialDescriptor::Transparent(_) => MaterialKind::Transparent,
            MaterialDescriptor::Translucent(_) => MaterialKind::Translucent,
            MaterialDescriptor::Principled(_) => MaterialKind::Principled,
            MaterialDescriptor::Holdout(_) => MaterialKind::Holdout,
            MaterialDescriptor::VolumeAbsorption(_) => MaterialKind::VolumeAbsorption,
            MaterialDescriptor::VolumeScatter(_) => MaterialKind::VolumeScatter,
            MaterialDescriptor::Add(_) => MaterialKind::Add,
            MaterialDescriptor::Mix(_) => MaterialKind::Mix,
            MaterialDescriptor::Multi(_) => MaterialKind::Multi,
            MaterialDescriptor::Background(_) => MaterialKind::Background,
            MaterialDescriptor::NodeGraph(_) => MaterialKind::NodeGraph,
            MaterialDescriptor::Placeholder(_) => MaterialKind::Placeholder,
        }
    }

    /// Display name, used for the shader name. Parameterless kinds use the kind name.
    pub fn display_name(&self) -> &str {
        match self {
            MaterialDescriptor::Diffuse(d) => &d.name,
            MaterialDescriptor::Glossy(d) => &d.name,
            MaterialDescriptor::Glass(d) => &d.name,
            MaterialDescriptor::Emission(d) => &d.name,
            MaterialDescriptor::Transparent(d) => &d.name,
            MaterialDescriptor::Translucent(d) => &d.name,
            MaterialDescriptor::Principled(d) => &d.name,
            MaterialDescriptor::VolumeAbsorption(d) => &d.name,
            MaterialDescriptor::VolumeScatter(d) => &d.name,
            MaterialDescriptor::Add(d) => &d.name,
            MaterialDescriptor::Mix(d) => &d.name,
            MaterialDescriptor::Multi(d) => &d.name,
            MaterialDescriptor::Background(d) => &d.name,
            MaterialDescriptor::NodeGraph(d) => &d.name,
            MaterialDescriptor::Holdout(_) => "Holdout",
            MaterialDescriptor::Placeholder(_) => "Placeholder",
        }
    }

    pub fn closure_class(&self) -> ClosureClass {
        match self {
            MaterialDescriptor::VolumeAbsorption(_) | MaterialDescriptor::VolumeScatter(_) => {
                ClosureClass::Volume
            }
            MaterialDescriptor::Add(d) => combined_class([d.a.as_deref(), d.b.as_deref()]),
            MaterialDescriptor::Mix(d) => combined_class([d.a.as_deref(), d.b.as_deref()]),
            MaterialDescriptor::Multi(_) => ClosureClass::Container,
            MaterialDescriptor::Background(_) | MaterialDescriptor::NodeGraph(_) => {
                ClosureClass::Special
            }
            _ => ClosureClass::Surface,
        }
    }
}

/// A combination is a volume only when every present operand is one.
fn combined_class(operands: [Option<&MaterialDescriptor>; 2]) -> ClosureClass {
    let mut present = operands.into_iter().flatten().peekable();
    if present.peek().is_none() {
        return ClosureClass::Surface;
    }
    if present.all(|d| d.closure_class() == ClosureClass::Volume) {
        ClosureClass::Volume
    } else {
        ClosureClass::Surface
    }
}

/// Snapshot `mat` at `time`.
///
/// Unknown classes become the placeholder descriptor. Sub-materials are read
/// recursively; empty slots stay `None`.
pub fn describe(mat: &dyn HostMaterial, time: EvalTime) -> MaterialDescriptor {
    describe_nested(mat, time, 0)
}

fn describe_nested(mat: &dyn HostMaterial, time: EvalTime, depth: usize) -> MaterialDescriptor {
    if depth > MAX_NESTING {
        log::warn!(
            "[describe] material '{}' nests deeper than {MAX_NESTING}; using placeholder",
            mat.name()
        );
        return MaterialDescriptor::Placeholder(PlaceholderDescriptor);
    }

    let Some(kind) = MaterialKind::from_class_name(mat.class_name()) else {
        log::warn!(
            "[describe] unsupported material class '{}' ({}); using placeholder",
            mat.class_name(),
            mat.name()
        );
        return MaterialDescriptor::Placeholder(PlaceholderDescriptor);
    };

    let sub = |slot: usize| -> Option<Box<MaterialDescriptor>> {
        mat.sub_material(slot)
            .map(|m| Box::new(describe_nested(m, time, depth + 1)))
    };

    match kind {
        MaterialKind::Diffuse => MaterialDescriptor::Diffuse(DiffuseDescriptor::read(mat, time)),
        MaterialKind::Glossy => MaterialDescriptor::Glossy(GlossyDescriptor::read(mat, time)),
        MaterialKind::Glass => MaterialDescriptor::Glass(GlassDescriptor::read(mat, time)),
        MaterialKind::Emission => {
            MaterialDescriptor::Emission(EmissionDescriptor::read(mat, time))
        }
        MaterialKind::Transparent => {
            MaterialDescriptor::Transparent(TransparentDescriptor::read(mat, time))
        }
        MaterialKind::Translucent => {
            MaterialDescriptor::Translucent(TranslucentDescriptor::read(mat, time))
        }
        MaterialKind::Principled => {
            MaterialDescriptor::Principled(PrincipledDescriptor::read(mat, time))
        }
        MaterialKind::Holdout => MaterialDescriptor::Holdout(HoldoutDescriptor),
        MaterialKind::VolumeAbsorption => {
            MaterialDescriptor::VolumeAbsorption(VolumeAbsorptionDescriptor::read(mat, time))
        }
        MaterialKind::VolumeScatter => {
            MaterialDescriptor::VolumeScatter(VolumeScatterDescriptor::read(mat, time))
        }
        MaterialKind::Add => MaterialDescriptor::Add(AddDescriptor {
            name: mat.name().to_string(),
            a: sub(0),
            b: sub(1),
        }),
        MaterialKind::Mix => MaterialDescriptor::Mix(MixDescriptor {
            name: mat.name().to_string(),
            fac: values::read_scalar(mat, "fac", time, 0.5),
            a: sub(0),
            b: sub(1),
        }),
        MaterialKind::Multi => MaterialDescriptor::Multi(MultiDescriptor {
            name: mat.name().to_string(),
            slots: (0..mat.sub_material_count())
                .map(|slot| sub(slot).map(|d| *d))
                .collect(),
        }),
        MaterialKind::Background => {
            MaterialDescriptor::Background(BackgroundDescriptor::read(mat, time))
        }
        MaterialKind::NodeGraph => MaterialDescriptor::NodeGraph(NodeGraphDescriptor::read(mat)),
        MaterialKind::Placeholder => MaterialDescriptor::Placeholder(PlaceholderDescriptor),
    }
}
