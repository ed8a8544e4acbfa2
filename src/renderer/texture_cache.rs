//! Texture reference -> renderer texture node.

use std::collections::HashMap;

use super::{
    graph::ShaderGraph,
    scene::RenderScene,
    types::{NodeId, NodeType, SocketValue, sockets},
};
use crate::host::TextureHandle;

/// Turns a host texture into a sampling node whose `color` output can drive any input.
pub trait TextureNodeSource {
    /// Must return the same node for the same handle within one graph.
    fn node_for(
        &mut self,
        texture: &TextureHandle,
        graph: &mut ShaderGraph,
        scene: &mut RenderScene,
    ) -> NodeId;
}

/// Default source: one scene image per texture id per session, one
/// `ImageTexture` node per texture id per graph.
#[derive(Debug, Default)]
pub struct TextureNodeCache {
    image_slots: HashMap<u64, usize>,
}

impl TextureNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_count(&self) -> usize {
        self.image_slots.len()
    }
}

impl TextureNodeSource for TextureNodeCache {
    fn node_for(
        &mut self,
        texture: &TextureHandle,
        graph: &mut ShaderGraph,
        scene: &mut RenderScene,
    ) -> NodeId {
        if let Some(node) = graph.texture_node(texture.id) {
            return node;
        }
        let slot = *self
            .image_slots
            .entry(texture.id)
            .or_insert_with(|| scene.add_image(texture));

        let node = graph.add(NodeType::ImageTexture, format!("tex.{}", texture.id));
        graph.set_input(node, sockets::IMAGE, SocketValue::Int(slot as i32));
        graph.set_input(node, sockets::FILENAME, SocketValue::Text(texture.path.clone()));
        graph.remember_texture_node(texture.id, node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_handle_reuses_node_within_graph_and_image_across_graphs() {
        let mut cache = TextureNodeCache::new();
        let mut scene = RenderScene::new();
        let tex = TextureHandle::new(7, "maps/bricks.png");

        let mut g1 = ShaderGraph::new();
        let a = cache.node_for(&tex, &mut g1, &mut scene);
        let b = cache.node_for(&tex, &mut g1, &mut scene);
        assert_eq!(a, b);
        assert_eq!(g1.count_of(NodeType::ImageTexture), 1);

        let mut g2 = ShaderGraph::new();
        let c = cache.node_for(&tex, &mut g2, &mut scene);
        assert_eq!(g2.input(c, sockets::IMAGE), Some(&SocketValue::Int(0)));
        assert_eq!(scene.images().len(), 1);
        assert_eq!(cache.image_count(), 1);
    }
}
