use node_forge_shader_bridge::{
    EvalTime, MaterialKind, RenderScene, ResolvedMaterial, SessionConfig, ShaderIndex,
    TranslationSession,
    library::MaterialLibrary,
    renderer::{NodeType, SocketValue, sockets},
};

fn library(json: &str) -> MaterialLibrary {
    MaterialLibrary::from_json_str(json, &SessionConfig::default()).unwrap()
}

fn resolve_all(lib: &MaterialLibrary, session: &mut TranslationSession) -> Vec<ResolvedMaterial> {
    lib.iter().map(|m| session.resolve(&**m)).collect()
}

fn shader(r: &ResolvedMaterial) -> ShaderIndex {
    r.shader().unwrap()
}

#[test]
fn same_diffuse_twice_builds_once() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "M1",
              "params": { "color": [0.7, 0.7, 0.7], "roughness": 0.0 } } ] }"#,
    );
    let m1 = lib.get("M1").unwrap();
    let mut session = TranslationSession::new(EvalTime(0));

    let a = session.resolve(&**m1);
    let b = session.resolve(&**m1);
    assert_eq!(a, b);
    assert_eq!(session.cache_len(MaterialKind::Diffuse), 1);
    assert_eq!(session.builds(), 1);
}

#[test]
fn names_keep_otherwise_equal_materials_apart() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "A", "params": { "color": [0.7, 0.7, 0.7] } },
            { "class": "Diffuse", "name": "B", "params": { "color": [0.7, 0.7, 0.7] } } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    assert_ne!(shader(&r[0]), shader(&r[1]));
    assert_eq!(session.cache_len(MaterialKind::Diffuse), 2);
}

#[test]
fn empty_graph_resolves_to_placeholder() {
    let lib = library(
        r#"{ "materials": [
            { "class": "NodeGraph", "name": "g", "graph": "" },
            { "class": "NodeGraph", "name": "none" } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    let placeholder = session.placeholder();
    assert_eq!(shader(&r[0]), placeholder);
    assert_eq!(shader(&r[1]), placeholder);
    assert_eq!(session.builds(), 1);
}

#[test]
fn unsupported_classes_share_the_placeholder() {
    let lib = library(
        r#"{ "materials": [
            { "class": "ArchitecturalMtl", "name": "arch" },
            { "class": "Toon", "name": "toon" },
            { "class": "NodeGraph", "name": "broken", "graph": "not a graph" } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    assert_eq!(shader(&r[0]), shader(&r[1]));
    assert_eq!(shader(&r[0]), shader(&r[2]));
    assert_eq!(session.builds(), 1);

    let index = shader(&r[0]);
    let g = &session.scene().shader(index).unwrap().graph;
    let emit = g.link_into(g.output(), sockets::SURFACE).unwrap().from;
    assert_eq!(g.input(emit, sockets::COLOR), Some(&SocketValue::Color([0.0; 3])));
}

#[test]
fn enabled_texture_replaces_constant() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "on", "params": { "color": [0.2, 0.2, 0.2] },
              "textures": { "color": { "id": 11, "path": "bricks.png" } } },
            { "class": "Diffuse", "name": "off", "params": { "color": [0.2, 0.2, 0.2] },
              "textures": { "color": { "id": 11, "path": "bricks.png", "enabled": false } } } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);

    let on = &session.scene().shader(shader(&r[0])).unwrap().graph;
    let bsdf = on.find_by_type(NodeType::DiffuseBsdf).unwrap();
    let link = on.link_into(bsdf, sockets::COLOR).unwrap();
    assert_eq!(on.node(link.from).unwrap().node_type, NodeType::ImageTexture);
    assert!(on.input(bsdf, sockets::COLOR).is_none());

    let off = &session.scene().shader(shader(&r[1])).unwrap().graph;
    let bsdf = off.find_by_type(NodeType::DiffuseBsdf).unwrap();
    assert!(off.link_into(bsdf, sockets::COLOR).is_none());
    assert_eq!(
        off.input(bsdf, sockets::COLOR),
        Some(&SocketValue::Color([0.2, 0.2, 0.2]))
    );
    assert_eq!(off.count_of(NodeType::ImageTexture), 0);
}

#[test]
fn shared_texture_is_one_scene_image() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "a",
              "textures": { "color": { "id": 3, "path": "t.png" },
                            "roughness": { "id": 3, "path": "t.png" } } },
            { "class": "Glossy", "name": "b",
              "textures": { "color": { "id": 3, "path": "t.png" } } } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    assert_eq!(session.scene().images().len(), 1);

    let a = &session.scene().shader(shader(&r[0])).unwrap().graph;
    assert_eq!(a.count_of(NodeType::ImageTexture), 1);
}

#[test]
fn mix_with_missing_operand_wires_only_the_present_one() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "d" },
            { "class": "Mix", "name": "m", "subs": ["d", null], "params": { "fac": 0.3 } } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);

    let g = &session.scene().shader(shader(&r[1])).unwrap().graph;
    let mix = g.find_by_type(NodeType::MixClosure).unwrap();
    assert!(g.link_into(mix, sockets::CLOSURE1).is_some());
    assert!(g.link_into(mix, sockets::CLOSURE2).is_none());
    assert_eq!(g.input(mix, sockets::FAC), Some(&SocketValue::Float(0.3)));
    assert_eq!(g.count_of(NodeType::Emission), 0);
}

#[test]
fn multi_resolves_per_slot_with_placeholder_gaps() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Diffuse", "name": "d" },
            { "class": "Glass", "name": "gl" },
            { "class": "Multi", "name": "inner", "subs": ["d"] },
            { "class": "Multi", "name": "outer", "subs": ["d", null, "gl", "inner"] } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    let d = shader(&r[0]);
    let gl = shader(&r[1]);

    let ResolvedMaterial::PerSlot(slots) = &r[3] else {
        panic!("expected per-slot resolution");
    };
    let placeholder = session.placeholder();
    assert_eq!(slots.get(&0), Some(&d));
    assert_eq!(slots.get(&1), Some(&placeholder));
    assert_eq!(slots.get(&2), Some(&gl));
    assert_eq!(slots.get(&3), Some(&placeholder));
}

#[test]
fn background_replaces_default_slot() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Background", "name": "sky",
              "params": { "color": [0.1, 0.2, 0.8], "strength": 3.0 } } ] }"#,
    );
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);
    assert_eq!(shader(&r[0]), RenderScene::BACKGROUND);

    let scene = session.into_scene();
    assert_eq!(scene.shader_count(), 1);
    let g = &scene.shader(RenderScene::BACKGROUND).unwrap().graph;
    let bg = g.find_by_type(NodeType::Background).unwrap();
    assert_eq!(g.input(bg, sockets::STRENGTH), Some(&SocketValue::Float(3.0)));
}

#[test]
fn keyframes_are_read_at_session_time() {
    let lib = library(
        r#"{ "materials": [
            { "class": "Emission", "name": "lamp",
              "params": { "strength": { "keys": [[0, 1.0], [100, 5.0]] } } } ] }"#,
    );
    let lamp = lib.get("lamp").unwrap();

    let strength_at = |t: i64| {
        let mut session = TranslationSession::new(EvalTime(t));
        let index = shader(&session.resolve(&**lamp));
        let g = session.scene().shader(index).unwrap().graph.clone();
        let node = g.find_by_type(NodeType::Emission).unwrap();
        g.input(node, sockets::STRENGTH).cloned()
    };
    assert_eq!(strength_at(50), Some(SocketValue::Float(1.0)));
    assert_eq!(strength_at(100), Some(SocketValue::Float(5.0)));
}

#[test]
fn freeform_graph_with_texture_and_normal_chain() {
    let graph = "nfgraph 1\\n[nodes]\\n\
        t ImageTexture image=i:0 filename=str:n.png\\n\
        n NormalMap strength=0.5 space=str:tangent\\n\
        p PrincipledBsdf base_color=tex:9:albedo.png roughness=0.4\\n\
        out Output\\n\
        [links]\\n\
        t.color -> n.color\\n\
        n.normal -> p.normal\\n\
        p.bsdf -> out.surface\\n";
    let json = format!(
        r#"{{ "materials": [ {{ "class": "NodeGraph", "name": "g", "graph": "{graph}" }} ] }}"#
    );
    let lib = library(&json);
    let mut session = TranslationSession::new(EvalTime(0));
    let r = resolve_all(&lib, &mut session);

    let g = &session.scene().shader(shader(&r[0])).unwrap().graph;
    let p = g.link_into(g.output(), sockets::SURFACE).unwrap().from;
    assert_eq!(g.node(p).unwrap().node_type, NodeType::PrincipledBsdf);
    assert_eq!(g.node(p).unwrap().name, "g/p");
    assert!(g.link_into(p, sockets::NORMAL).is_some());
    let albedo = g.link_into(p, sockets::BASE_COLOR).unwrap().from;
    assert_eq!(g.node(albedo).unwrap().node_type, NodeType::ImageTexture);
    assert_eq!(session.scene().images().len(), 1);
}
