use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use node_forge_shader_bridge::{
    EvalTime, ParamValue, SessionConfig, TranslationSession,
    library::MaterialLibrary,
    persist::{
        FILE_EXTENSION, GRAPH_CHUNK, PersistedMaterial, load_material, read_chunks, save_material,
    },
    renderer::{NodeType, SocketValue, sockets},
};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// Removes the file when the test ends.
struct TempFile(PathBuf);

impl TempFile {
    fn new(stem: &str) -> Self {
        let n = NEXT.fetch_add(1, Ordering::SeqCst);
        Self(std::env::temp_dir().join(format!(
            "{stem}-{}-{n}.{FILE_EXTENSION}",
            std::process::id()
        )))
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn legacy_diffuse() -> PersistedMaterial {
    let mut params = BTreeMap::new();
    params.insert("diffuse_color".to_string(), ParamValue::Color([1.0, 0.0, 0.0]));
    PersistedMaterial {
        version: 1,
        class: "Diffuse".to_string(),
        name: "old".to_string(),
        params,
        ..Default::default()
    }
}

fn diffuse_color(lib: &MaterialLibrary, name: &str) -> Option<SocketValue> {
    let mut session = TranslationSession::new(EvalTime(0));
    let index = session.resolve(&**lib.get(name).unwrap()).shader().unwrap();
    let g = &session.scene().shader(index).unwrap().graph;
    let bsdf = g.find_by_type(NodeType::DiffuseBsdf).unwrap();
    g.input(bsdf, sockets::COLOR).cloned()
}

#[test]
fn legacy_file_migrates_before_resolving() {
    let file = TempFile::new("legacy");
    save_material(&file.0, &legacy_diffuse()).unwrap();

    let lib = MaterialLibrary::from_path(&file.0, &SessionConfig::default()).unwrap();
    assert_eq!(lib.len(), 1);
    assert_eq!(
        diffuse_color(&lib, "old"),
        Some(SocketValue::Color([1.0, 0.0, 0.0]))
    );

    let opted_out = SessionConfig {
        migrate_legacy: false,
        ..SessionConfig::default()
    };
    let lib = MaterialLibrary::from_path(&file.0, &opted_out).unwrap();
    assert_ne!(
        diffuse_color(&lib, "old"),
        Some(SocketValue::Color([1.0, 0.0, 0.0]))
    );
}

#[test]
fn edited_graph_survives_save_and_load() {
    let graph = "nfgraph 1\n[nodes]\nd DiffuseBsdf color=rgb:0,0,1\nout Output\n[links]\nd.bsdf -> out.surface\n";
    let lib = MaterialLibrary::from_json_str(
        r#"{ "materials": [ { "class": "NodeGraph", "name": "g" } ] }"#,
        &SessionConfig::default(),
    )
    .unwrap();
    let edited = lib.get("g").unwrap().with_graph(graph);

    let file = TempFile::new("graph");
    save_material(&file.0, &edited.to_persisted(EvalTime(0))).unwrap();

    let bytes = std::fs::read(&file.0).unwrap();
    let chunks = read_chunks(&bytes).unwrap();
    let graph_chunks: Vec<_> = chunks.iter().filter(|(id, _)| *id == GRAPH_CHUNK).collect();
    assert_eq!(graph_chunks.len(), 1);
    assert_eq!(graph_chunks[0].1, graph.as_bytes());

    let reloaded = MaterialLibrary::from_path(&file.0, &SessionConfig::default()).unwrap();
    assert_eq!(
        diffuse_color(&reloaded, "g"),
        Some(SocketValue::Color([0.0, 0.0, 1.0]))
    );
}

#[test]
fn unnamed_record_takes_the_file_stem() {
    let file = TempFile::new("stem");
    let mut m = legacy_diffuse();
    m.name.clear();
    save_material(&file.0, &m).unwrap();
    assert!(load_material(&file.0).unwrap().name.is_empty());

    let lib = MaterialLibrary::from_path(&file.0, &SessionConfig::default()).unwrap();
    let stem = file.0.file_stem().unwrap().to_string_lossy().into_owned();
    assert!(lib.get(&stem).is_some());
}
