//! Configuration management for tvplay
//!
//! Handles config file loading/saving.
//! Config is stored at ~/.config/tvplay/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Catalog endpoint used when the config file has none
const DEFAULT_CATALOG_URL: &str = "http://localhost/tv/tv_station_list.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Station list endpoint
    pub catalog_url: String,
    /// Base URL station logo references resolve against
    pub logo_base_url: Option<String>,
    /// mpv binary override (defaults to "mpv" on PATH)
    pub player_binary: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            logo_base_url: None,
            player_binary: None,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/tvplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tvplay").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// mpv binary to spawn
    pub fn player_binary(&self) -> &str {
        self.player_binary.as_deref().unwrap_or("mpv")
    }

    /// Absolute logo URL for a station's logo reference, for the
    /// presentation layer. `None` when no base is configured or the
    /// station has no logo.
    pub fn logo_url(&self, logo_ref: &str) -> Option<String> {
        if logo_ref.is_empty() {
            return None;
        }
        self.logo_base_url
            .as_ref()
            .map(|base| format!("{}logo/{}", base, logo_ref))
    }
}
