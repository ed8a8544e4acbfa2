use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::host::EvalTime;

fn default_editor_poll_ms() -> u64 {
    50
}

fn default_migrate_legacy() -> bool {
    true
}

/// Per-run settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub time: EvalTime,
    #[serde(default = "default_editor_poll_ms")]
    pub editor_poll_ms: u64,
    /// Run the post-load migration for materials saved in an older layout.
    #[serde(default = "default_migrate_legacy")]
    pub migrate_legacy: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time: EvalTime::default(),
            editor_poll_ms: default_editor_poll_ms(),
            migrate_legacy: default_migrate_legacy(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: SessionConfig = serde_json::from_str(text).context("invalid session config")?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.editor_poll_ms.max(1))
    }
}
