//! Saved material state and its upgrade path.
//!
//! A saved material is a sequence of chunks, each `u16 id | u32 len | bytes`
//! (little endian). The graph text is stored verbatim in one chunk so it can
//! be read back without touching the parameter layout. Records written by an
//! older schema are upgraded after load by [`PostLoadMigration`].
//!
//! Files on disk use the `.nfmat` extension.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::host::{ParamValue, TextureHandle};

pub const VERSION_CHUNK: u16 = 0x0001;
pub const HEADER_CHUNK: u16 = 0x0002;
pub const GRAPH_CHUNK: u16 = 0x0100;
pub const PARAMS_CHUNK: u16 = 0x0200;
pub const TEXTURES_CHUNK: u16 = 0x0300;

pub const FILE_EXTENSION: &str = "nfmat";

pub const MAX_CHUNK_LEN: usize = 16 * 1024 * 1024;

/// Current parameter layout. Version 1 used the names in [`LEGACY_FIELD_MAP`].
pub const SCHEMA_VERSION: u32 = 2;

/// Legacy field name -> current field name.
pub const LEGACY_FIELD_MAP: &[(&str, &str)] = &[
    ("diffuse_color", "color"),
    ("diffuse_roughness", "roughness"),
    ("gloss_roughness", "roughness"),
    ("refraction_index", "ior"),
    ("emit_color", "color"),
    ("emit_strength", "strength"),
    ("bump_strength", "normal_strength"),
    ("bump_space", "normal_space"),
    ("flip_green", "normal_invert_green"),
    ("mix_amount", "fac"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedMaterial {
    pub version: u32,
    pub class: String,
    pub name: String,
    pub graph: String,
    pub params: BTreeMap<String, ParamValue>,
    pub textures: BTreeMap<String, TextureHandle>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    class: String,
    name: String,
}

fn write_chunk(out: &mut Vec<u8>, id: u16, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_CHUNK_LEN {
        bail!("chunk {id:#06x} too large: {} bytes", payload.len());
    }
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

pub fn encode_material(m: &PersistedMaterial) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_chunk(&mut out, VERSION_CHUNK, &m.version.to_le_bytes())?;
    let header = serde_json::to_vec(&Header {
        class: m.class.clone(),
        name: m.name.clone(),
    })
    .context("failed to encode header")?;
    write_chunk(&mut out, HEADER_CHUNK, &header)?;
    write_chunk(&mut out, GRAPH_CHUNK, m.graph.as_bytes())?;
    let params = serde_json::to_vec(&m.params).context("failed to encode params")?;
    write_chunk(&mut out, PARAMS_CHUNK, &params)?;
    if !m.textures.is_empty() {
        let textures = serde_json::to_vec(&m.textures).context("failed to encode textures")?;
        write_chunk(&mut out, TEXTURES_CHUNK, &textures)?;
    }
    Ok(out)
}

/// Split `bytes` into `(id, payload)` chunks.
pub fn read_chunks(bytes: &[u8]) -> Result<Vec<(u16, &[u8])>> {
    let mut chunks = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < 6 {
            bail!("truncated chunk header ({} bytes left)", rest.len());
        }
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let len = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;
        if len > MAX_CHUNK_LEN {
            bail!("chunk {id:#06x} too large: {len} bytes");
        }
        let body = &rest[6..];
        if body.len() < len {
            bail!("chunk {id:#06x} truncated: want {len} bytes, have {}", body.len());
        }
        chunks.push((id, &body[..len]));
        rest = &body[len..];
    }
    Ok(chunks)
}

/// Decode a saved material. A missing version chunk means schema 1.
pub fn decode_material(bytes: &[u8]) -> Result<PersistedMaterial> {
    let mut m = PersistedMaterial {
        version: 1,
        ..Default::default()
    };
    for (id, payload) in read_chunks(bytes)? {
        match id {
            VERSION_CHUNK => {
                let raw: [u8; 4] = payload
                    .try_into()
                    .map_err(|_| anyhow!("version chunk must be 4 bytes, got {}", payload.len()))?;
                m.version = u32::from_le_bytes(raw);
            }
            HEADER_CHUNK => {
                let header: Header =
                    serde_json::from_slice(payload).context("invalid header chunk")?;
                m.class = header.class;
                m.name = header.name;
            }
            GRAPH_CHUNK => {
                m.graph = String::from_utf8(payload.to_vec()).context("graph chunk is not UTF-8")?;
            }
            PARAMS_CHUNK => {
                m.params = serde_json::from_slice(payload).context("invalid params chunk")?;
            }
            TEXTURES_CHUNK => {
                m.textures = serde_json::from_slice(payload).context("invalid textures chunk")?;
            }
            other => log::debug!("[persist] skipping unknown chunk {other:#06x}"),
        }
    }
    if m.version > SCHEMA_VERSION {
        bail!(
            "material saved with schema {} (supported: ..={SCHEMA_VERSION})",
            m.version
        );
    }
    Ok(m)
}

pub fn save_material(path: &Path, m: &PersistedMaterial) -> Result<()> {
    let bytes = encode_material(m)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write material {}", path.display()))?;
    log::info!("[persist] saved '{}' to {}", m.name, path.display());
    Ok(())
}

pub fn load_material(path: &Path) -> Result<PersistedMaterial> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read material {}", path.display()))?;
    decode_material(&bytes).with_context(|| format!("in {}", path.display()))
}

/// Move legacy fields to their current names. Returns whether anything changed.
///
/// A current field that is already set is never overwritten. Running it twice
/// is the same as running it once.
pub fn migrate_fields<V>(version: &mut u32, params: &mut BTreeMap<String, V>) -> bool {
    if *version >= SCHEMA_VERSION {
        return false;
    }
    for (old, new) in LEGACY_FIELD_MAP {
        if let Some(v) = params.remove(*old) {
            params.entry((*new).to_string()).or_insert(v);
        }
    }
    *version = SCHEMA_VERSION;
    true
}

/// Upgrade queue filled during load and drained once loading is complete.
#[derive(Debug)]
pub struct PostLoadMigration {
    enabled: bool,
    deferred: Vec<String>,
}

impl PostLoadMigration {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            deferred: Vec::new(),
        }
    }

    /// Remember `name` if it was saved with an older schema.
    pub fn defer(&mut self, name: &str, version: u32) {
        if version < SCHEMA_VERSION && !self.deferred.iter().any(|n| n == name) {
            self.deferred.push(name.to_string());
        }
    }

    pub fn pending(&self) -> &[String] {
        &self.deferred
    }

    /// Apply `migrate` to every deferred record. Returns how many changed.
    ///
    /// When disabled the queue is dropped and records keep their old layout.
    pub fn run(&mut self, mut migrate: impl FnMut(&str) -> bool) -> usize {
        let deferred = std::mem::take(&mut self.deferred);
        if !self.enabled {
            if !deferred.is_empty() {
                log::info!(
                    "[persist] legacy migration disabled; {} material(s) keep the old layout",
                    deferred.len()
                );
            }
            return 0;
        }
        let mut changed = 0;
        for name in &deferred {
            if migrate(name) {
                log::debug!("[persist] migrated '{name}' to schema {SCHEMA_VERSION}");
                changed += 1;
            }
        }
        changed
    }
}
