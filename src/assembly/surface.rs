//! Single-closure kinds: one BSDF, emission, volume or background node each.

use super::{
    AssemblyContext, ClosureOutput,
    normal_map::append_normal_map,
    params::{wire_rgb, wire_scalar},
};
use crate::{
    descriptor::{
        BackgroundDescriptor, DiffuseDescriptor, Distribution, EmissionDescriptor,
        GlassDescriptor, GlossyDescriptor, NormalMapDescriptor, PrincipledDescriptor, Rgb,
        TranslucentDescriptor, TransparentDescriptor, VolumeAbsorptionDescriptor,
        VolumeScatterDescriptor,
    },
    renderer::{NodeId, NodeType, SocketValue, sockets},
};

fn closure(node_type: NodeType, node: NodeId) -> ClosureOutput {
    ClosureOutput::new(node, node_type.principal_output())
}

fn set_distribution(ctx: &mut AssemblyContext<'_>, node: NodeId, d: Distribution) {
    ctx.graph.set_input(
        node,
        sockets::DISTRIBUTION,
        SocketValue::Text(d.as_str().to_string()),
    );
}

fn maybe_normal(ctx: &mut AssemblyContext<'_>, node: NodeId, nm: &Option<NormalMapDescriptor>) {
    if let Some(nm) = nm {
        append_normal_map(ctx, node, nm);
    }
}

pub fn diffuse(ctx: &mut AssemblyContext<'_>, d: &DiffuseDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::DiffuseBsdf, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    wire_scalar(ctx, node, sockets::ROUGHNESS, &d.roughness);
    maybe_normal(ctx, node, &d.normal);
    closure(NodeType::DiffuseBsdf, node)
}

pub fn glossy(ctx: &mut AssemblyContext<'_>, d: &GlossyDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::GlossyBsdf, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    wire_scalar(ctx, node, sockets::ROUGHNESS, &d.roughness);
    set_distribution(ctx, node, d.distribution);
    maybe_normal(ctx, node, &d.normal);
    closure(NodeType::GlossyBsdf, node)
}

pub fn glass(ctx: &mut AssemblyContext<'_>, d: &GlassDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::GlassBsdf, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    wire_scalar(ctx, node, sockets::ROUGHNESS, &d.roughness);
    wire_scalar(ctx, node, sockets::IOR, &d.ior);
    set_distribution(ctx, node, d.distribution);
    maybe_normal(ctx, node, &d.normal);
    closure(NodeType::GlassBsdf, node)
}

pub fn emission(ctx: &mut AssemblyContext<'_>, d: &EmissionDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::Emission, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    wire_scalar(ctx, node, sockets::STRENGTH, &d.strength);
    closure(NodeType::Emission, node)
}

pub fn transparent(ctx: &mut AssemblyContext<'_>, d: &TransparentDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::TransparentBsdf, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    closure(NodeType::TransparentBsdf, node)
}

pub fn translucent(ctx: &mut AssemblyContext<'_>, d: &TranslucentDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::TranslucentBsdf, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    maybe_normal(ctx, node, &d.normal);
    closure(NodeType::TranslucentBsdf, node)
}

pub fn principled(ctx: &mut AssemblyContext<'_>, d: &PrincipledDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::PrincipledBsdf, &d.name);
    wire_rgb(ctx, node, sockets::BASE_COLOR, &d.base_color);
    wire_scalar(ctx, node, sockets::METALLIC, &d.metallic);
    wire_scalar(ctx, node, sockets::ROUGHNESS, &d.roughness);
    wire_scalar(ctx, node, sockets::SPECULAR, &d.specular);
    wire_scalar(ctx, node, sockets::IOR, &d.ior);
    wire_scalar(ctx, node, sockets::TRANSMISSION, &d.transmission);
    wire_rgb(ctx, node, sockets::EMISSION_COLOR, &d.emission_color);
    wire_scalar(ctx, node, sockets::EMISSION_STRENGTH, &d.emission_strength);
    wire_scalar(ctx, node, sockets::ALPHA, &d.alpha);
    maybe_normal(ctx, node, &d.normal);
    closure(NodeType::PrincipledBsdf, node)
}

pub fn holdout(ctx: &mut AssemblyContext<'_>) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::Holdout, "holdout");
    closure(NodeType::Holdout, node)
}

pub fn volume_absorption(
    ctx: &mut AssemblyContext<'_>,
    d: &VolumeAbsorptionDescriptor,
) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::AbsorptionVolume, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    ctx.graph
        .set_input(node, sockets::DENSITY, SocketValue::Float(d.density.0));
    closure(NodeType::AbsorptionVolume, node)
}

pub fn volume_scatter(ctx: &mut AssemblyContext<'_>, d: &VolumeScatterDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::ScatterVolume, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    ctx.graph
        .set_input(node, sockets::DENSITY, SocketValue::Float(d.density.0));
    ctx.graph
        .set_input(node, sockets::ANISOTROPY, SocketValue::Float(d.anisotropy.0));
    closure(NodeType::ScatterVolume, node)
}

pub fn background(ctx: &mut AssemblyContext<'_>, d: &BackgroundDescriptor) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::Background, &d.name);
    wire_rgb(ctx, node, sockets::COLOR, &d.color);
    wire_scalar(ctx, node, sockets::STRENGTH, &d.strength);
    closure(NodeType::Background, node)
}

/// Flat black: an emission of black at zero strength.
pub fn placeholder(ctx: &mut AssemblyContext<'_>) -> ClosureOutput {
    let node = ctx.graph.add(NodeType::Emission, "placeholder");
    ctx.graph
        .set_input(node, sockets::COLOR, SocketValue::Color(Rgb::BLACK.0));
    ctx.graph
        .set_input(node, sockets::STRENGTH, SocketValue::Float(0.0));
    closure(NodeType::Emission, node)
}
