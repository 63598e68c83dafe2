use anyhow::Context;
use dropzone_core::DropConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "dropzone.config.json";

/// Path of the config file: `explicit` if given, otherwise the default
/// name inside `cwd`
pub fn config_path(cwd: &str, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => PathBuf::from(cwd).join(path),
        None => PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME),
    }
}

/// Load the drop configuration.
///
/// A missing default config yields the default rules; a missing explicit
/// config is an error.
pub fn load(cwd: &str, explicit: Option<&Path>) -> anyhow::Result<DropConfig> {
    let path = config_path(cwd, explicit);

    if !path.exists() {
        if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        tracing::debug!("No {} found, using default draggables", DEFAULT_CONFIG_NAME);
        return Ok(DropConfig::default());
    }

    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config =
        DropConfig::from_json(&content).with_context(|| format!("Invalid config file {}", path.display()))?;

    tracing::debug!("Loaded {} draggable(s) from {}", config.draggables.len(), path.display());
    Ok(config)
}
