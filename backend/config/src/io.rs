//! Config file location and reading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the chatcmd config directory.
/// Priority: `CHATCMD_CONFIG_DIR` env > `~/.chatcmd/` > `./.chatcmd`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATCMD_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".chatcmd"))
        .unwrap_or_else(|| PathBuf::from(".chatcmd"))
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the config file as an untyped value tree.
///
/// Returns `Ok(None)` if the file doesn't exist. The untyped form lets
/// env substitution run before the typed schema is applied.
pub async fn load_raw(path: &Path) -> Result<Option<Value>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    // An empty YAML document parses as null.
    Ok(Some(if value.is_null() { Value::Object(Default::default()) } else { value }))
}
