//! Shared tangent-space normal mapping.

use super::{AssemblyContext, params::wire_scalar};
use crate::{
    descriptor::{NormalMapDescriptor, ParamSlot},
    renderer::{NodeId, NodeType, SocketValue, sockets},
};

/// Insert a normal-map node in front of `target.normal`.
///
/// With `invert_green` a mapped color goes through
/// SeparateRgb -> Invert(g) -> CombineRgb. A constant color is inverted in place.
pub fn append_normal_map(ctx: &mut AssemblyContext<'_>, target: NodeId, nm: &NormalMapDescriptor) {
    let map = ctx.graph.add(NodeType::NormalMap, "normal_map");
    ctx.graph.set_input(
        map,
        sockets::SPACE,
        SocketValue::Text(nm.space.as_str().to_string()),
    );
    wire_scalar(ctx, map, sockets::STRENGTH, &nm.strength);

    match &nm.color {
        ParamSlot::Constant(c) => {
            let mut v = c.0;
            if nm.invert_green {
                v[1] = 1.0 - v[1];
            }
            ctx.graph.set_input(map, sockets::COLOR, SocketValue::Color(v));
        }
        ParamSlot::Texture(tex) => {
            let tex_node = ctx.texture_node(tex);
            let color = if nm.invert_green {
                invert_green_chain(ctx, tex_node)
            } else {
                tex_node
            };
            ctx.graph.connect(color, sockets::COLOR, map, sockets::COLOR);
        }
    }

    ctx.graph.connect(map, sockets::NORMAL, target, sockets::NORMAL);
}

fn invert_green_chain(ctx: &mut AssemblyContext<'_>, source: NodeId) -> NodeId {
    let g = &mut *ctx.graph;
    let split = g.add(NodeType::SeparateRgb, "normal_split");
    g.connect(source, sockets::COLOR, split, sockets::COLOR);

    let invert = g.add(NodeType::Invert, "normal_invert_g");
    g.set_input(invert, sockets::FAC, SocketValue::Float(1.0));
    g.connect(split, sockets::G, invert, sockets::COLOR);

    let join = g.add(NodeType::CombineRgb, "normal_join");
    g.connect(split, sockets::R, join, sockets::R);
    g.connect(invert, sockets::COLOR, join, sockets::G);
    g.connect(split, sockets::B, join, sockets::B);
    join
}
