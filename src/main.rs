use std::{
    path::{Path, PathBuf},
    thread,
};

use anyhow::{Result, anyhow, bail};
use node_forge_shader_bridge::{
    EvalTime, HostMaterial, MaterialKind, ResolvedMaterial, SessionConfig, TranslationSession,
    editor::{EditorBridge, EditorState, OpenOutcome, WsEditorSession},
    library::{LibraryMaterial, MaterialLibrary},
    persist::save_material,
};

const DEFAULT_EDITOR_ADDR: &str = "127.0.0.1:8081";

#[derive(Debug, Default, Clone)]
struct Cli {
    materials: Option<PathBuf>,
    time: Option<i64>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    edit: Option<String>,
    editor_addr: Option<String>,
    save: Option<PathBuf>,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = |name: &str| -> Result<String> {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {name}"))
        };
        match flag {
            "--materials" => cli.materials = Some(PathBuf::from(value(flag)?)),
            "--time" => {
                let v = value(flag)?;
                cli.time = Some(
                    v.parse()
                        .map_err(|e| anyhow!("invalid --time '{v}': {e}"))?,
                );
            }
            "--config" => cli.config = Some(PathBuf::from(value(flag)?)),
            "--out" => cli.out = Some(PathBuf::from(value(flag)?)),
            "--edit" => cli.edit = Some(value(flag)?),
            "--editor-addr" => cli.editor_addr = Some(value(flag)?),
            "--save" => cli.save = Some(PathBuf::from(value(flag)?)),
            other => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --materials <lib.json>, --time <ticks>, --config <cfg.json>, --out <scene.json>, --edit <material>, --editor-addr <host:port>, --save <material.nfmat>)"
                ));
            }
        }
        i += 2;
    }
    Ok(cli)
}

fn print_resolution(name: &str, resolved: &ResolvedMaterial) {
    match resolved {
        ResolvedMaterial::Shader(index) => println!("{name}: {index}"),
        ResolvedMaterial::PerSlot(slots) => {
            let parts: Vec<String> = slots
                .iter()
                .map(|(slot, index)| format!("{slot}={index}"))
                .collect();
            println!("{name}: [{}]", parts.join(", "));
        }
    }
}

fn write_scene(session: &TranslationSession, out: Option<&Path>) -> Result<()> {
    if let Some(out) = out {
        session.scene().write_json(out)?;
        log::info!("[cli] wrote {}", out.display());
    }
    Ok(())
}

/// Returns the last edited version of `material`, if the editor sent any.
fn run_edit_loop(
    material: &LibraryMaterial,
    addr: &str,
    cfg: &SessionConfig,
    session: &mut TranslationSession,
    out: Option<&Path>,
) -> Result<Option<LibraryMaterial>> {
    if material.class_name() != MaterialKind::NodeGraph.as_str() {
        bail!(
            "material '{}' is a {}, only {} materials can be edited",
            material.name,
            material.class,
            MaterialKind::NodeGraph
        );
    }

    let ws = WsEditorSession::bind(addr, Some(material.name.clone()))?;
    let mut bridge = EditorBridge::global(cfg.poll_period());
    let initial = material.graph_text().unwrap_or_default();
    match bridge.open(Box::new(ws), &initial)? {
        OpenOutcome::Opened => log::info!("[cli] editing '{}' on ws://{addr}", material.name),
        OpenOutcome::AlreadyOpen | OpenOutcome::Busy => bail!("an editor is already open"),
    }

    let mut last = None;
    loop {
        let closed = bridge.refresh() == EditorState::Closed;
        if let Some(graph) = bridge.take_edited() {
            let edited = material.with_graph(graph);
            print_resolution(&edited.name, &session.resolve(&edited));
            write_scene(session, out)?;
            last = Some(edited);
        }
        if closed {
            break;
        }
        thread::sleep(cfg.poll_period());
    }
    log::info!("[cli] editor closed");
    Ok(last)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&args)?;

    let mut cfg = match &cli.config {
        Some(path) => SessionConfig::from_path(path)?,
        None => SessionConfig::default(),
    };
    if let Some(t) = cli.time {
        cfg.time = EvalTime(t);
    }

    let Some(materials) = &cli.materials else {
        bail!("--materials <lib.json> is required");
    };
    let lib = MaterialLibrary::from_path(materials, &cfg)?;

    let mut session = TranslationSession::new(cfg.time);
    for m in lib.iter() {
        print_resolution(&m.name, &session.resolve(&**m));
    }
    log::info!(
        "[cli] {} material(s) -> {} shader(s) built, {} image(s)",
        lib.len(),
        session.builds(),
        session.scene().images().len()
    );

    if cli.save.is_some() && cli.edit.is_none() {
        bail!("--save requires --edit <material>");
    }
    if let Some(name) = &cli.edit {
        let material = lib
            .get(name)
            .ok_or_else(|| anyhow!("no material named '{name}'"))?;
        let addr = cli.editor_addr.as_deref().unwrap_or(DEFAULT_EDITOR_ADDR);
        let edited = run_edit_loop(material, addr, &cfg, &mut session, cli.out.as_deref())?;
        if let Some(path) = &cli.save {
            let saved = edited.as_ref().unwrap_or(&**material);
            save_material(path, &saved.to_persisted(cfg.time))?;
        }
    }

    write_scene(&session, cli.out.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let cli = parse_cli(&args(&[
            "--materials",
            "lib.json",
            "--time",
            "-160",
            "--out",
            "scene.json",
            "--edit",
            "g",
            "--editor-addr",
            "0.0.0.0:9000",
            "--save",
            "g.nfmat",
        ]))
        .unwrap();
        assert_eq!(cli.materials, Some(PathBuf::from("lib.json")));
        assert_eq!(cli.time, Some(-160));
        assert_eq!(cli.out, Some(PathBuf::from("scene.json")));
        assert_eq!(cli.edit.as_deref(), Some("g"));
        assert_eq!(cli.editor_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(cli.save, Some(PathBuf::from("g.nfmat")));
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(parse_cli(&args(&["--headless"])).is_err());
        assert!(parse_cli(&args(&["--materials"])).is_err());
        assert!(parse_cli(&args(&["--time", "soon"])).is_err());
    }
}
