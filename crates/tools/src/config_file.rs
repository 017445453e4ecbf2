//! TOML configuration files, with prefab layouts optionally kept in their own
//! text files next to the configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dungen_core::DungeonConfig;
use dungen_core::prefab::PrefabConfig;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(flatten)]
    config: DungeonConfig,
    prefabs: Vec<PrefabEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrefabEntry {
    #[serde(flatten)]
    prefab: PrefabConfig,
    /// Layout text file, relative to the configuration file.
    layout_file: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<DungeonConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&text, base).with_context(|| format!("invalid config file: {}", path.display()))
}

/// Parses configuration text; `layout_file` entries resolve against `base`.
pub fn parse_config(text: &str, base: &Path) -> Result<DungeonConfig> {
    let file: ConfigFile = toml::from_str(text).context("failed to parse TOML")?;
    let mut config = file.config;
    config.prefabs = file
        .prefabs
        .into_iter()
        .map(|entry| resolve_prefab(entry, base))
        .collect::<Result<_>>()?;
    config.validate()?;
    Ok(config)
}

fn resolve_prefab(entry: PrefabEntry, base: &Path) -> Result<PrefabConfig> {
    let PrefabEntry { mut prefab, layout_file } = entry;
    let Some(layout_file) = layout_file else {
        return Ok(prefab);
    };
    if !prefab.layout.trim().is_empty() {
        bail!("prefab '{}' sets both layout and layout_file", prefab.name);
    }
    let path = base.join(&layout_file);
    prefab.layout = fs::read_to_string(&path).with_context(|| {
        format!("failed to read layout for prefab '{}': {}", prefab.name, path.display())
    })?;
    debug!(prefab = %prefab.name, path = %path.display(), "loaded prefab layout");
    Ok(prefab)
}

/// The default configuration as TOML, as a starting point for a config file.
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&DungeonConfig::default()).context("failed to render default config")
}
