//! Application configuration management.
//!
//! Credentials for the server-to-server OAuth exchange live in a JSON file,
//! either passed explicitly on the command line or read from
//! `~/.config/usagebridge/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for the default config directory path
const APP_NAME: &str = "usagebridge";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: String,
    pub company_id: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

// Manual Debug so the client secret never lands in logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("company_id", &self.company_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
