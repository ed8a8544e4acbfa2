//! JSON material library: a stand-alone host for the translator.
//!
//! ```json
//! { "materials": [
//!     { "class": "Diffuse", "name": "M1",
//!       "params": { "color": [0.7, 0.7, 0.7],
//!                   "roughness": { "keys": [[0, 0.0], [4800, 0.5]] } },
//!       "textures": { "color": { "id": 1, "path": "wood.png", "enabled": false } } },
//!     { "class": "Mix", "name": "blend", "subs": ["M1", null] }
//! ] }
//! ```
//!
//! Keyframed parameters hold their value until the next key. Keys may be
//! listed in any order. Sub-materials are referenced by name and must not
//! form a cycle.
//!
//! A single saved material (`.nfmat`, see [`crate::persist`]) loads as a
//! library of one.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::{
    config::SessionConfig,
    graph::topo_sort,
    host::{EvalTime, HostMaterial, ParamValue, TextureHandle},
    persist::{
        FILE_EXTENSION, PersistedMaterial, PostLoadMigration, SCHEMA_VERSION, load_material,
        migrate_fields,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamTrack {
    Keyed { keys: Vec<(EvalTime, ParamValue)> },
    Constant(ParamValue),
}

impl ParamTrack {
    fn sort_keys(&mut self) {
        if let ParamTrack::Keyed { keys } = self {
            keys.sort_by_key(|(t, _)| *t);
        }
    }

    /// Step interpolation. Before the first key the first key holds. Expects
    /// keys sorted by time, which the library guarantees on load.
    pub fn at(&self, time: EvalTime) -> Option<ParamValue> {
        match self {
            ParamTrack::Constant(v) => Some(v.clone()),
            ParamTrack::Keyed { keys } => keys
                .iter()
                .take_while(|(t, _)| *t <= time)
                .last()
                .or_else(|| keys.first())
                .map(|(_, v)| v.clone()),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureBinding {
    pub id: u64,
    pub path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn current_schema() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMaterial {
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamTrack>,
    #[serde(default)]
    pub textures: BTreeMap<String, TextureBinding>,
    #[serde(default)]
    pub subs: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
    #[serde(default = "current_schema")]
    pub version: u32,
    #[serde(skip)]
    linked: Vec<Option<Arc<LibraryMaterial>>>,
}

impl LibraryMaterial {
    /// Copy with the graph text replaced. Sub-material links are kept.
    pub fn with_graph(&self, graph: impl Into<String>) -> LibraryMaterial {
        LibraryMaterial {
            graph: Some(graph.into()),
            ..self.clone()
        }
    }

    /// Snapshot for saving. Keyframed parameters are stored as their value at
    /// `time`; disabled textures and sub-material links are not saved.
    pub fn to_persisted(&self, time: EvalTime) -> PersistedMaterial {
        PersistedMaterial {
            version: self.version,
            class: self.class.clone(),
            name: self.name.clone(),
            graph: self.graph.clone().unwrap_or_default(),
            params: self
                .params
                .iter()
                .filter_map(|(k, track)| Some((k.clone(), track.at(time)?)))
                .collect(),
            textures: self
                .textures
                .keys()
                .filter_map(|k| Some((k.clone(), self.texture(k)?)))
                .collect(),
        }
    }

    /// Rebuild a material from a saved record. `fallback_name` is used when the
    /// record carries no name.
    pub fn from_persisted(p: PersistedMaterial, fallback_name: &str) -> Result<LibraryMaterial> {
        if p.class.is_empty() {
            bail!("saved material has no class");
        }
        let name = if p.name.is_empty() {
            fallback_name.to_string()
        } else {
            p.name
        };
        Ok(LibraryMaterial {
            class: p.class,
            name,
            params: p
                .params
                .into_iter()
                .map(|(k, v)| (k, ParamTrack::Constant(v)))
                .collect(),
            textures: p
                .textures
                .into_iter()
                .map(|(k, t)| {
                    let binding = TextureBinding {
                        id: t.id,
                        path: t.path,
                        enabled: true,
                    };
                    (k, binding)
                })
                .collect(),
            subs: Vec::new(),
            graph: (!p.graph.is_empty()).then_some(p.graph),
            version: p.version,
            linked: Vec::new(),
        })
    }
}

impl HostMaterial for LibraryMaterial {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, param: &str, time: EvalTime) -> Option<ParamValue> {
        self.params.get(param).and_then(|t| t.at(time))
    }

    fn texture(&self, param: &str) -> Option<TextureHandle> {
        self.textures
            .get(param)
            .filter(|t| t.enabled)
            .map(|t| TextureHandle::new(t.id, t.path.clone()))
    }

    fn sub_material_count(&self) -> usize {
        self.linked.len()
    }

    fn sub_material(&self, slot: usize) -> Option<&dyn HostMaterial> {
        self.linked
            .get(slot)?
            .as_deref()
            .map(|m| m as &dyn HostMaterial)
    }

    fn graph_text(&self) -> Option<String> {
        self.graph.clone()
    }
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    materials: Vec<LibraryMaterial>,
}

/// Materials in file order, sub-materials linked.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<Arc<LibraryMaterial>>,
    by_name: HashMap<String, usize>,
}

impl MaterialLibrary {
    /// Load a JSON library, or a single saved material when the extension is
    /// `.nfmat`.
    pub fn from_path(path: &Path, cfg: &SessionConfig) -> Result<Self> {
        if path.extension().is_some_and(|e| e == FILE_EXTENSION) {
            let saved = load_material(path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let m = LibraryMaterial::from_persisted(saved, &stem)
                .with_context(|| format!("in {}", path.display()))?;
            return Self::from_materials(vec![m], cfg);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read material library {}", path.display()))?;
        Self::from_json_str(&text, cfg).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_json_str(text: &str, cfg: &SessionConfig) -> Result<Self> {
        let file: LibraryFile = serde_json::from_str(text).context("invalid material library")?;
        Self::from_materials(file.materials, cfg)
    }

    pub fn from_materials(mut raw: Vec<LibraryMaterial>, cfg: &SessionConfig) -> Result<Self> {
        for m in &mut raw {
            m.params.values_mut().for_each(ParamTrack::sort_keys);
        }

        let mut migration = PostLoadMigration::new(cfg.migrate_legacy);
        for m in &raw {
            migration.defer(&m.name, m.version);
        }
        migration.run(|name| {
            raw.iter_mut()
                .find(|m| m.name == name)
                .is_some_and(|m| migrate_fields(&mut m.version, &mut m.params))
        });

        let file_order: Vec<String> = raw.iter().map(|m| m.name.clone()).collect();
        let build_order = {
            let mut seen = HashSet::new();
            for m in &raw {
                if !seen.insert(m.name.as_str()) {
                    bail!("duplicate material name: {}", m.name);
                }
            }
            for m in &raw {
                for sub in m.subs.iter().flatten() {
                    if !seen.contains(sub.as_str()) {
                        bail!("material '{}' references unknown sub-material '{sub}'", m.name);
                    }
                }
            }
            let edges = raw.iter().flat_map(|m| {
                m.subs
                    .iter()
                    .flatten()
                    .map(move |sub| (sub.as_str(), m.name.as_str()))
            });
            topo_sort(raw.iter().map(|m| m.name.as_str()), edges)
                .context("sub-material references form a cycle")?
        };

        let mut pending: HashMap<String, LibraryMaterial> =
            raw.into_iter().map(|m| (m.name.clone(), m)).collect();
        let mut built: HashMap<String, Arc<LibraryMaterial>> = HashMap::new();
        for name in build_order {
            let mut m = pending
                .remove(&name)
                .ok_or_else(|| anyhow!("material not found: {name}"))?;
            m.linked = m
                .subs
                .iter()
                .map(|s| s.as_ref().and_then(|n| built.get(n).cloned()))
                .collect();
            built.insert(name, Arc::new(m));
        }

        let mut lib = MaterialLibrary::default();
        for name in file_order {
            let m = built
                .remove(&name)
                .ok_or_else(|| anyhow!("material not found: {name}"))?;
            lib.by_name.insert(name, lib.materials.len());
            lib.materials.push(m);
        }
        Ok(lib)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<LibraryMaterial>> {
        self.by_name.get(name).map(|i| &self.materials[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LibraryMaterial>> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
