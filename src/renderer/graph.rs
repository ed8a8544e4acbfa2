//! Renderer shader graph: nodes addressed by [`NodeId`], links between sockets.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::types::{NodeId, NodeType, SocketValue};

#[derive(Debug, Clone, Serialize)]
pub struct ShaderNode {
    pub node_type: NodeType,
    pub name: String,
    /// Constant inputs. An input that has an incoming link never appears here.
    pub inputs: BTreeMap<String, SocketValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub from: NodeId,
    pub from_socket: String,
    pub to: NodeId,
    pub to_socket: String,
}

/// A directed node graph owned by one [`Shader`](super::scene::Shader).
///
/// Node 0 is always the output node.
#[derive(Debug, Clone, Serialize)]
pub struct ShaderGraph {
    nodes: Vec<ShaderNode>,
    links: Vec<Link>,
    /// Texture id -> sampling node already present in this graph.
    #[serde(skip)]
    texture_nodes: HashMap<u64, NodeId>,
}

impl Default for ShaderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderGraph {
    pub const OUTPUT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![ShaderNode {
                node_type: NodeType::Output,
                name: "output".to_string(),
                inputs: BTreeMap::new(),
            }],
            links: Vec::new(),
            texture_nodes: HashMap::new(),
        }
    }

    pub fn output(&self) -> NodeId {
        Self::OUTPUT
    }

    pub fn add(&mut self, node_type: NodeType, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ShaderNode {
            node_type,
            name: name.into(),
            inputs: BTreeMap::new(),
        });
        id
    }

    /// Bind a constant. Drops any link into the same socket.
    pub fn set_input(&mut self, node: NodeId, socket: &str, value: SocketValue) {
        self.links.retain(|l| !(l.to == node && l.to_socket == socket));
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.inputs.insert(socket.to_string(), value);
        }
    }

    /// Link `from.from_socket` into `to.to_socket`, replacing whatever drove that input.
    pub fn connect(&mut self, from: NodeId, from_socket: &str, to: NodeId, to_socket: &str) {
        self.links
            .retain(|l| !(l.to == to && l.to_socket == to_socket));
        if let Some(n) = self.nodes.get_mut(to.0) {
            n.inputs.remove(to_socket);
        }
        self.links.push(Link {
            from,
            from_socket: from_socket.to_string(),
            to,
            to_socket: to_socket.to_string(),
        });
    }

    pub fn node(&self, id: NodeId) -> Option<&ShaderNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[ShaderNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn input(&self, node: NodeId, socket: &str) -> Option<&SocketValue> {
        self.nodes.get(node.0).and_then(|n| n.inputs.get(socket))
    }

    /// The link driving `node.socket`, if any.
    pub fn link_into(&self, node: NodeId, socket: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.to == node && l.to_socket == socket)
    }

    pub fn links_into(&self, node: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.to == node)
    }

    pub fn count_of(&self, node_type: NodeType) -> usize {
        self.nodes.iter().filter(|n| n.node_type == node_type).count()
    }

    pub fn find_by_type(&self, node_type: NodeType) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.node_type == node_type)
            .map(NodeId)
    }

    pub(crate) fn texture_node(&self, texture_id: u64) -> Option<NodeId> {
        self.texture_nodes.get(&texture_id).copied()
    }

    pub(crate) fn remember_texture_node(&mut self, texture_id: u64, node: NodeId) {
        self.texture_nodes.insert(texture_id, node);
    }
}
