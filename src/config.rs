use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Where confirmed template output is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum InsertMode {
    #[default]
    Clipboard,
    /// Printed on stdout once the terminal is restored.
    Stdout,
}

/// The summon shortcut recognised while typing (`[command]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CommandConfig {
    pub(crate) sequence: String,
    /// Idle gap in milliseconds after which partial input is forgotten.
    pub(crate) timeout_ms: u64,
    /// Number of recent characters kept while looking for the sequence.
    pub(crate) buffer_len: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            sequence: "//m".to_string(),
            timeout_ms: 1000,
            buffer_len: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/merlin/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MerlinConfig {
    pub(crate) insert_mode: InsertMode,
    /// List inactive templates in the picker.
    pub(crate) show_inactive: bool,
    pub(crate) status_duration_ms: u64,
    pub(crate) double_click_ms: u64,
    pub(crate) command: CommandConfig,
}

impl Default for MerlinConfig {
    fn default() -> Self {
        Self {
            insert_mode: InsertMode::Clipboard,
            show_inactive: false,
            status_duration_ms: 1500,
            double_click_ms: 400,
            command: CommandConfig::default(),
        }
    }
}

pub(crate) fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("merlin")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub(crate) fn load_or_init() -> Result<MerlinConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MerlinConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: MerlinConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
