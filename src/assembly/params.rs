//! The uniform per-parameter wiring rule.
//!
//! A texture slot becomes a sampling node linked into the input; a constant
//! slot is written straight into the input and creates no node.

use super::AssemblyContext;
use crate::{
    descriptor::{ParamSlot, Rgb, Scalar},
    graph_codec::DeclValue,
    host::TextureHandle,
    renderer::{NodeId, SocketValue, sockets},
};

fn wire_texture(ctx: &mut AssemblyContext<'_>, node: NodeId, socket: &str, tex: &TextureHandle) {
    let tex_node = ctx.texture_node(tex);
    ctx.graph.connect(tex_node, sockets::COLOR, node, socket);
}

pub fn wire_scalar(
    ctx: &mut AssemblyContext<'_>,
    node: NodeId,
    socket: &str,
    slot: &ParamSlot<Scalar>,
) {
    match slot {
        ParamSlot::Constant(v) => ctx.graph.set_input(node, socket, SocketValue::Float(v.0)),
        ParamSlot::Texture(tex) => wire_texture(ctx, node, socket, tex),
    }
}

pub fn wire_rgb(ctx: &mut AssemblyContext<'_>, node: NodeId, socket: &str, slot: &ParamSlot<Rgb>) {
    match slot {
        ParamSlot::Constant(c) => ctx.graph.set_input(node, socket, SocketValue::Color(c.0)),
        ParamSlot::Texture(tex) => wire_texture(ctx, node, socket, tex),
    }
}

/// Same rule for values declared inside an encoded graph.
pub fn wire_decl(ctx: &mut AssemblyContext<'_>, node: NodeId, socket: &str, value: &DeclValue) {
    match value {
        DeclValue::Socket(v) => ctx.graph.set_input(node, socket, v.clone()),
        DeclValue::Texture(tex) => wire_texture(ctx, node, socket, tex),
    }
}
