//! Client configuration
//!
//! Layered: built-in defaults, then `~/.config/bulk-update-cli/config.toml`,
//! then environment variables (a `.env` file is honoured), then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::TableId;

pub const ENV_API_URL: &str = "BULK_UPDATE_API_URL";
pub const ENV_TOKEN: &str = "BULK_UPDATE_TOKEN";
pub const ENV_DOWNLOAD_DIR: &str = "BULK_UPDATE_DOWNLOAD_DIR";

const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the analytics backend
    pub api_url: String,
    /// Identity token sent as `x-access-token`
    pub token: Option<String>,
    /// Where downloaded templates are written
    pub download_dir: PathBuf,
    /// Table preselected by the wizard
    pub default_table: TableId,
    /// Per-request timeout; unset means wait indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            download_dir: PathBuf::from("."),
            default_table: TableId::default(),
            request_timeout_secs: None,
        }
    }
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bulk-update-cli")
        .join("config.toml")
}

impl Config {
    /// Load from `path` (or the default location) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            log::debug!("Loaded config from {}", path.display());
            config
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Overlay values found through `lookup` (normally `std::env::var`)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.is_empty()) {
            self.download_dir = PathBuf::from(dir);
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Token with everything but the last four characters hidden
    pub fn masked_token(&self) -> String {
        match &self.token {
            None => "(not set)".to_string(),
            Some(token) => {
                let chars: Vec<char> = token.chars().collect();
                if chars.len() <= 4 {
                    "*".repeat(chars.len())
                } else {
                    let tail: String = chars[chars.len() - 4..].iter().collect();
                    format!("{}{}", "*".repeat(chars.len() - 4), tail)
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
