//! Graph-authored materials: instantiate an encoded graph into renderer nodes.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};

use super::{AssemblyContext, ClosureOutput, params::wire_decl};
use crate::{
    descriptor::NodeGraphDescriptor,
    graph_codec::{EncodedGraph, parse_graph},
    renderer::{NodeId, NodeType, sockets},
};

/// What the graph's `Output` declaration had connected.
#[derive(Debug, Default)]
pub struct FreeformTerminals {
    pub surface: Option<ClosureOutput>,
    pub volume: Option<ClosureOutput>,
}

impl FreeformTerminals {
    /// The closure a combinator should consume: surface first, else volume.
    pub fn principal(self) -> Option<ClosureOutput> {
        self.surface.or(self.volume)
    }
}

fn output_decl_id(graph: &EncodedGraph) -> Result<String> {
    let outputs: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Output.as_str())
        .map(|n| n.id.as_str())
        .collect();
    if outputs.len() != 1 {
        bail!("expected exactly 1 Output node, got {}", outputs.len());
    }
    Ok(outputs[0].to_string())
}

/// Where a validated link attaches once nodes exist.
enum LinkTarget<'g> {
    Node(&'g str, &'g str),
    Surface,
    Volume,
}

/// Parse `d.graph` and add its nodes to `ctx.graph`.
///
/// The graph's own `Output` node is not instantiated; its incoming links are
/// returned instead so the caller decides where they attach. Nodes that do not
/// reach the output are dropped. An inline value on a linked input is ignored.
/// Every check runs before the first node is added, so an `Err` leaves
/// `ctx.graph` and the scene's images untouched.
pub fn instantiate(
    ctx: &mut AssemblyContext<'_>,
    d: &NodeGraphDescriptor,
) -> Result<FreeformTerminals> {
    if d.graph.trim().is_empty() {
        bail!("material '{}' has no graph", d.name);
    }
    let parsed =
        parse_graph(&d.graph).with_context(|| format!("invalid graph for material '{}'", d.name))?;
    let out_id = output_decl_id(&parsed)?;
    let graph = parsed.treeshake(&out_id);

    let mut planned = Vec::new();
    for id in graph.topo_order()? {
        if id == out_id {
            continue;
        }
        let decl = graph
            .find_node(&id)
            .ok_or_else(|| anyhow!("node not found: {id}"))?;
        let node_type: NodeType = decl.node_type.parse()?;
        planned.push((decl, node_type));
    }

    let known = |id: &str| planned.iter().any(|(decl, _)| decl.id == id);
    let mut links = Vec::with_capacity(graph.links.len());
    for link in &graph.links {
        if link.from.node_id == out_id {
            bail!("Output node has no outputs (link from {}.{})", out_id, link.from.socket);
        }
        if !known(&link.from.node_id) {
            bail!("node not found: {}", link.from.node_id);
        }
        let target = if link.to.node_id == out_id {
            match link.to.socket.as_str() {
                sockets::SURFACE => LinkTarget::Surface,
                sockets::VOLUME => LinkTarget::Volume,
                other => bail!("unsupported Output terminal: {other}"),
            }
        } else if known(&link.to.node_id) {
            LinkTarget::Node(link.to.node_id.as_str(), link.to.socket.as_str())
        } else {
            bail!("node not found: {}", link.to.node_id);
        };
        links.push((&link.from, target));
    }

    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    for (decl, node_type) in planned {
        let node = ctx.graph.add(node_type, format!("{}/{}", d.name, decl.id));
        for (socket, value) in &decl.params {
            if graph.incoming_link(&decl.id, socket).is_some() {
                continue;
            }
            wire_decl(ctx, node, socket, value);
        }
        ids.insert(decl.id.as_str(), node);
    }

    let mut terminals = FreeformTerminals::default();
    for (from, target) in links {
        let Some(&from_node) = ids.get(from.node_id.as_str()) else {
            continue;
        };
        match target {
            LinkTarget::Surface => {
                terminals.surface = Some(ClosureOutput::new(from_node, from.socket.clone()))
            }
            LinkTarget::Volume => {
                terminals.volume = Some(ClosureOutput::new(from_node, from.socket.clone()))
            }
            LinkTarget::Node(to, to_socket) => {
                if let Some(&to_node) = ids.get(to) {
                    ctx.graph.connect(from_node, &from.socket, to_node, to_socket);
                }
            }
        }
    }

    Ok(terminals)
}
