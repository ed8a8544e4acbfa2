//! Graph assembly: descriptor -> renderer node subgraph.
//!
//! Two entry points:
//! - [`assemble_closure`] adds a descriptor's nodes to an existing graph and
//!   returns its principal closure output. Combinators recurse through it.
//! - [`assemble_shader`] builds a whole shader and wires the closure to the
//!   output terminal that matches the descriptor's [`ClosureClass`].

pub mod combine;
pub mod freeform;
pub mod normal_map;
pub mod params;
pub mod surface;

use anyhow::{Result, bail};

use crate::{
    descriptor::{ClosureClass, MAX_NESTING, MaterialDescriptor},
    host::TextureHandle,
    renderer::{NodeId, RenderScene, Shader, ShaderGraph, TextureNodeSource, sockets},
};

/// Mutable state one assembly pass works against.
pub struct AssemblyContext<'a> {
    pub graph: &'a mut ShaderGraph,
    pub scene: &'a mut RenderScene,
    pub textures: &'a mut dyn TextureNodeSource,
}

impl<'a> AssemblyContext<'a> {
    pub fn new(
        graph: &'a mut ShaderGraph,
        scene: &'a mut RenderScene,
        textures: &'a mut dyn TextureNodeSource,
    ) -> Self {
        Self {
            graph,
            scene,
            textures,
        }
    }

    pub fn texture_node(&mut self, texture: &TextureHandle) -> NodeId {
        self.textures.node_for(texture, self.graph, self.scene)
    }
}

/// A node output carrying a closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureOutput {
    pub node: NodeId,
    pub socket: String,
}

impl ClosureOutput {
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// Node-level entry point. `Ok(None)` means the descriptor contributes no closure.
pub fn assemble_closure(
    ctx: &mut AssemblyContext<'_>,
    desc: &MaterialDescriptor,
    depth: usize,
) -> Result<Option<ClosureOutput>> {
    if depth > MAX_NESTING {
        bail!("material nesting exceeds {MAX_NESTING} levels");
    }

    let out = match desc {
        MaterialDescriptor::Diffuse(d) => surface::diffuse(ctx, d),
        MaterialDescriptor::Glossy(d) => surface::glossy(ctx, d),
        MaterialDescriptor::Glass(d) => surface::glass(ctx, d),
        MaterialDescriptor::Emission(d) => surface::emission(ctx, d),
        MaterialDescriptor::Transparent(d) => surface::transparent(ctx, d),
        MaterialDescriptor::Translucent(d) => surface::translucent(ctx, d),
        MaterialDescriptor::Principled(d) => surface::principled(ctx, d),
        MaterialDescriptor::Holdout(_) => surface::holdout(ctx),
        MaterialDescriptor::VolumeAbsorption(d) => surface::volume_absorption(ctx, d),
        MaterialDescriptor::VolumeScatter(d) => surface::volume_scatter(ctx, d),
        MaterialDescriptor::Background(d) => surface::background(ctx, d),
        MaterialDescriptor::Placeholder(_) => surface::placeholder(ctx),
        MaterialDescriptor::Add(d) => combine::add(ctx, d, depth),
        MaterialDescriptor::Mix(d) => combine::mix(ctx, d, depth),
        MaterialDescriptor::NodeGraph(d) => return Ok(freeform::instantiate(ctx, d)?.principal()),
        MaterialDescriptor::Multi(d) => {
            bail!("multi material '{}' cannot be used as a closure", d.name)
        }
    };
    Ok(Some(out))
}

/// Build a complete shader for `desc`.
///
/// Container descriptors are rejected; the builder resolves them to their
/// sub-materials instead.
pub fn assemble_shader(
    desc: &MaterialDescriptor,
    scene: &mut RenderScene,
    textures: &mut dyn TextureNodeSource,
) -> Result<Shader> {
    let mut graph = ShaderGraph::new();
    let output = graph.output();
    let mut ctx = AssemblyContext::new(&mut graph, scene, textures);

    match (desc.closure_class(), desc) {
        (ClosureClass::Container, _) => {
            bail!("container material '{}' has no shader of its own", desc.display_name())
        }
        (ClosureClass::Special, MaterialDescriptor::NodeGraph(d)) => {
            let terminals = freeform::instantiate(&mut ctx, d)?;
            if let Some(s) = terminals.surface {
                ctx.graph.connect(s.node, &s.socket, output, sockets::SURFACE);
            }
            if let Some(v) = terminals.volume {
                ctx.graph.connect(v.node, &v.socket, output, sockets::VOLUME);
            }
        }
        (class, _) => {
            let terminal = match class {
                ClosureClass::Volume => sockets::VOLUME,
                _ => sockets::SURFACE,
            };
            if let Some(c) = assemble_closure(&mut ctx, desc, 0)? {
                ctx.graph.connect(c.node, &c.socket, output, terminal);
            }
        }
    }

    Ok(Shader::new(desc.display_name(), graph))
}

/// The fixed fallback shader: flat black on the surface terminal.
pub fn placeholder_shader(scene: &mut RenderScene, textures: &mut dyn TextureNodeSource) -> Shader {
    let mut graph = ShaderGraph::new();
    let output = graph.output();
    let mut ctx = AssemblyContext::new(&mut graph, scene, textures);
    let c = surface::placeholder(&mut ctx);
    ctx.graph.connect(c.node, &c.socket, output, sockets::SURFACE);
    Shader::new("Placeholder", graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{
            AddDescriptor, BackgroundDescriptor, DiffuseDescriptor, MixDescriptor,
            MultiDescriptor, NodeGraphDescriptor, ParamSlot, Rgb, Scalar,
            VolumeScatterDescriptor,
        },
        host::TextureHandle,
        renderer::{NodeType, SocketValue, TextureNodeCache},
    };

    fn diffuse(name: &str) -> MaterialDescriptor {
        MaterialDescriptor::Diffuse(DiffuseDescriptor {
            name: name.to_string(),
            color: ParamSlot::Constant(Rgb::grey(0.7)),
            roughness: ParamSlot::Constant(Scalar(0.0)),
            normal: None,
        })
    }

    fn build(desc: &MaterialDescriptor) -> Result<Shader> {
        let mut scene = RenderScene::new();
        let mut textures = TextureNodeCache::new();
        assemble_shader(desc, &mut scene, &mut textures)
    }

    #[test]
    fn diffuse_wires_bsdf_into_surface() {
        let shader = build(&diffuse("M1")).unwrap();
        let g = &shader.graph;
        let link = g.link_into(g.output(), sockets::SURFACE).unwrap();
        assert_eq!(g.node(link.from).unwrap().node_type, NodeType::DiffuseBsdf);
        assert_eq!(link.from_socket, sockets::BSDF);
        assert_eq!(g.len(), 2);
        assert_eq!(shader.name, "M1");
    }

    #[test]
    fn texture_wins_over_constant() {
        let desc = MaterialDescriptor::Diffuse(DiffuseDescriptor {
            name: "tex".to_string(),
            color: ParamSlot::Texture(TextureHandle::new(1, "c.png")),
            roughness: ParamSlot::Constant(Scalar(0.0)),
            normal: None,
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        let bsdf = g.find_by_type(NodeType::DiffuseBsdf).unwrap();
        let link = g.link_into(bsdf, sockets::COLOR).unwrap();
        assert_eq!(g.node(link.from).unwrap().node_type, NodeType::ImageTexture);
        assert!(g.input(bsdf, sockets::COLOR).is_none());
    }

    #[test]
    fn volume_kinds_feed_volume_terminal() {
        let desc = MaterialDescriptor::VolumeScatter(VolumeScatterDescriptor {
            name: "fog".to_string(),
            color: ParamSlot::Constant(Rgb::WHITE),
            density: Scalar(0.1),
            anisotropy: Scalar(0.3),
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        assert!(g.link_into(g.output(), sockets::SURFACE).is_none());
        assert!(g.link_into(g.output(), sockets::VOLUME).is_some());
    }

    #[test]
    fn add_with_no_operands_has_no_closure_inputs() {
        let desc = MaterialDescriptor::Add(AddDescriptor {
            name: "empty".to_string(),
            a: None,
            b: None,
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        let add = g.find_by_type(NodeType::AddClosure).unwrap();
        assert_eq!(g.links_into(add).count(), 0);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn nested_mix_stays_in_one_graph() {
        let inner = MaterialDescriptor::Mix(MixDescriptor {
            name: "inner".to_string(),
            fac: ParamSlot::Constant(Scalar(0.25)),
            a: Some(Box::new(diffuse("a"))),
            b: Some(Box::new(diffuse("b"))),
        });
        let outer = MaterialDescriptor::Mix(MixDescriptor {
            name: "outer".to_string(),
            fac: ParamSlot::Texture(TextureHandle::new(2, "mask.png")),
            a: Some(Box::new(inner)),
            b: None,
        });
        let shader = build(&outer).unwrap();
        let g = &shader.graph;
        assert_eq!(g.count_of(NodeType::MixClosure), 2);
        assert_eq!(g.count_of(NodeType::DiffuseBsdf), 2);

        let top = g.link_into(g.output(), sockets::SURFACE).unwrap().from;
        assert_eq!(g.node(top).unwrap().name, "outer");
        assert!(g.link_into(top, sockets::CLOSURE1).is_some());
        assert!(g.link_into(top, sockets::CLOSURE2).is_none());
        assert!(g.link_into(top, sockets::FAC).is_some());
    }

    #[test]
    fn unsupported_operand_becomes_inline_placeholder() {
        let desc = MaterialDescriptor::Add(AddDescriptor {
            name: "add".to_string(),
            a: Some(Box::new(MaterialDescriptor::Multi(MultiDescriptor {
                name: "multi".to_string(),
                slots: vec![],
            }))),
            b: None,
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        let add = g.find_by_type(NodeType::AddClosure).unwrap();
        let a = g.link_into(add, sockets::CLOSURE1).unwrap().from;
        assert_eq!(g.node(a).unwrap().node_type, NodeType::Emission);
        assert_eq!(g.input(a, sockets::STRENGTH), Some(&SocketValue::Float(0.0)));
    }

    #[test]
    fn failed_graph_operand_leaves_no_nodes_behind() {
        let desc = MaterialDescriptor::Mix(MixDescriptor {
            name: "mix".to_string(),
            fac: ParamSlot::Constant(Scalar(0.5)),
            a: Some(Box::new(MaterialDescriptor::NodeGraph(NodeGraphDescriptor {
                name: "g".to_string(),
                graph: "nfgraph 1\n[nodes]\n\
                        d DiffuseBsdf color=tex:7:a.png\n\
                        out Output\n\
                        [links]\n\
                        d.bsdf -> out.displacement\n"
                    .to_string(),
            }))),
            b: Some(Box::new(diffuse("b"))),
        });
        let mut scene = RenderScene::new();
        let mut textures = TextureNodeCache::new();
        let shader = assemble_shader(&desc, &mut scene, &mut textures).unwrap();
        let g = &shader.graph;

        assert_eq!(g.count_of(NodeType::DiffuseBsdf), 1);
        assert_eq!(g.count_of(NodeType::ImageTexture), 0);
        assert!(g.nodes().iter().all(|n| !n.name.starts_with("g/")));
        assert!(scene.images().is_empty());

        let mix = g.find_by_type(NodeType::MixClosure).unwrap();
        let a = g.link_into(mix, sockets::CLOSURE1).unwrap().from;
        assert_eq!(g.node(a).unwrap().name, "placeholder");
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn background_operand_becomes_placeholder() {
        let desc = MaterialDescriptor::Add(AddDescriptor {
            name: "add".to_string(),
            a: Some(Box::new(MaterialDescriptor::Background(BackgroundDescriptor {
                name: "sky".to_string(),
                color: ParamSlot::Constant(Rgb::WHITE),
                strength: ParamSlot::Constant(Scalar(2.0)),
            }))),
            b: None,
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        assert_eq!(g.count_of(NodeType::Background), 0);
        let add = g.find_by_type(NodeType::AddClosure).unwrap();
        let a = g.link_into(add, sockets::CLOSURE1).unwrap().from;
        assert_eq!(g.input(a, sockets::STRENGTH), Some(&SocketValue::Float(0.0)));
    }

    #[test]
    fn nesting_past_the_limit_falls_back_to_placeholder() {
        let mut desc = diffuse("leaf");
        for i in 0..MAX_NESTING + 8 {
            desc = MaterialDescriptor::Add(AddDescriptor {
                name: format!("add{i}"),
                a: Some(Box::new(desc)),
                b: None,
            });
        }
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        assert_eq!(g.count_of(NodeType::AddClosure), MAX_NESTING + 1);
        assert_eq!(g.count_of(NodeType::DiffuseBsdf), 0);

        let deepest = g
            .nodes()
            .iter()
            .position(|n| n.node_type == NodeType::Emission)
            .unwrap();
        assert_eq!(g.nodes()[deepest].name, "placeholder");
    }

    #[test]
    fn container_has_no_shader() {
        let desc = MaterialDescriptor::Multi(MultiDescriptor {
            name: "multi".to_string(),
            slots: vec![Some(diffuse("a"))],
        });
        assert!(build(&desc).is_err());
    }

    #[test]
    fn freeform_graph_wires_declared_terminals() {
        let desc = MaterialDescriptor::NodeGraph(NodeGraphDescriptor {
            name: "graph".to_string(),
            graph: "nfgraph 1\n[nodes]\n\
                    e Emission color=rgb:1,0.5,0 strength=i:3\n\
                    v ScatterVolume density=0.2\n\
                    out Output\n\
                    [links]\n\
                    e.emission -> out.surface\n\
                    v.volume -> out.volume\n"
                .to_string(),
        });
        let shader = build(&desc).unwrap();
        let g = &shader.graph;
        let surf = g.link_into(g.output(), sockets::SURFACE).unwrap();
        assert_eq!(g.node(surf.from).unwrap().name, "graph/e");
        assert_eq!(
            g.input(surf.from, sockets::STRENGTH),
            Some(&SocketValue::Int(3))
        );
        assert!(g.link_into(g.output(), sockets::VOLUME).is_some());
    }

    #[test]
    fn freeform_graph_errors_surface_to_caller() {
        let bad_type = MaterialDescriptor::NodeGraph(NodeGraphDescriptor {
            name: "g".to_string(),
            graph: "nfgraph 1\n[nodes]\nx Teapot\nout Output\n[links]\nx.bsdf -> out.surface\n"
                .to_string(),
        });
        assert!(build(&bad_type).is_err());

        let no_output = MaterialDescriptor::NodeGraph(NodeGraphDescriptor {
            name: "g".to_string(),
            graph: "nfgraph 1\n[nodes]\nd DiffuseBsdf\n".to_string(),
        });
        let err = build(&no_output).unwrap_err();
        assert!(format!("{err:#}").contains("Output"));
    }

    #[test]
    fn placeholder_is_flat_black() {
        let mut scene = RenderScene::new();
        let mut textures = TextureNodeCache::new();
        let shader = placeholder_shader(&mut scene, &mut textures);
        let g = &shader.graph;
        let link = g.link_into(g.output(), sockets::SURFACE).unwrap();
        assert_eq!(
            g.input(link.from, sockets::COLOR),
            Some(&SocketValue::Color([0.0, 0.0, 0.0]))
        );
    }
}
