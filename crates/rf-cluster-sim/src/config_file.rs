//! Game config files
//!
//! Overrides are read as JSON or YAML, picked by file extension. Missing
//! fields fall back to the defaults; the result is validated before use.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rf_cluster::GameConfig;

use crate::error::{SimError, SimResult};

/// Serialization format of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from a path's extension
    pub fn from_path(path: &Path) -> SimResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            other => Err(SimError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Parse config text in the given format and validate it
pub fn parse_game_config(text: &str, format: ConfigFormat) -> SimResult<GameConfig> {
    let config: GameConfig = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Yaml => serde_yml::from_str(text)?,
    };
    config.validate()?;
    Ok(config)
}

/// Render a config in the given format
pub fn render_game_config(config: &GameConfig, format: ConfigFormat) -> SimResult<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yml::to_string(config)?,
    })
}

/// Load and validate a config file
pub fn load_game_config(path: &Path) -> SimResult<GameConfig> {
    let format = ConfigFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let config = parse_game_config(&text, format)?;
    log::info!("loaded game config from {}", path.display());
    Ok(config)
}

/// Write a config file, format from the extension
pub fn save_game_config(config: &GameConfig, path: &Path) -> SimResult<()> {
    let format = ConfigFormat::from_path(path)?;
    fs::write(path, render_game_config(config, format)?)?;
    Ok(())
}
