//! Add and mix: combinators over operand closures.
//!
//! Operands are assembled through the node-level entry point into the same
//! graph, so nesting never produces intermediate shaders. An empty operand
//! leaves its input unconnected.

use super::{AssemblyContext, ClosureOutput, assemble_closure, params::wire_scalar, surface};
use crate::{
    descriptor::{AddDescriptor, MaterialDescriptor, MixDescriptor},
    renderer::{NodeType, sockets},
};

fn operand(
    ctx: &mut AssemblyContext<'_>,
    desc: Option<&MaterialDescriptor>,
    depth: usize,
) -> Option<ClosureOutput> {
    let desc = desc?;
    if let MaterialDescriptor::Background(_) = desc {
        log::warn!(
            "[assembly] background '{}' cannot be combined, substituting placeholder",
            desc.display_name()
        );
        return Some(surface::placeholder(ctx));
    }
    match assemble_closure(ctx, desc, depth + 1) {
        Ok(out) => out,
        Err(e) => {
            log::warn!(
                "[assembly] operand '{}' ({}) failed, substituting placeholder: {e:#}",
                desc.display_name(),
                desc.kind()
            );
            Some(surface::placeholder(ctx))
        }
    }
}

pub fn add(ctx: &mut AssemblyContext<'_>, d: &AddDescriptor, depth: usize) -> ClosureOutput {
    let a = operand(ctx, d.a.as_deref(), depth);
    let b = operand(ctx, d.b.as_deref(), depth);

    let node = ctx.graph.add(NodeType::AddClosure, &d.name);
    if let Some(a) = a {
        ctx.graph.connect(a.node, &a.socket, node, sockets::CLOSURE1);
    }
    if let Some(b) = b {
        ctx.graph.connect(b.node, &b.socket, node, sockets::CLOSURE2);
    }
    ClosureOutput::new(node, sockets::CLOSURE)
}

pub fn mix(ctx: &mut AssemblyContext<'_>, d: &MixDescriptor, depth: usize) -> ClosureOutput {
    let a = operand(ctx, d.a.as_deref(), depth);
    let b = operand(ctx, d.b.as_deref(), depth);

    let node = ctx.graph.add(NodeType::MixClosure, &d.name);
    wire_scalar(ctx, node, sockets::FAC, &d.fac);
    if let Some(a) = a {
        ctx.graph.connect(a.node, &a.socket, node, sockets::CLOSURE1);
    }
    if let Some(b) = b {
        ctx.graph.connect(b.node, &b.socket, node, sockets::CLOSURE2);
    }
    ClosureOutput::new(node, sockets::CLOSURE)
}
