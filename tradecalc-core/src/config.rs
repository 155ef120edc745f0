//! `tradecalc.toml`: share-link base URL, TUI state path and per-tool
//! defaults (the values used when a key is absent from the URL).
//!
//! ```toml
//! base_url = "https://calc.example/"
//!
//! [defaults.position_sizing]
//! capital = 5000
//! max_leverage = 20
//!
//! [defaults.dip_buy]
//! dips = [97, 93, 88]
//! ```
//!
//! Every field is optional; missing sections fall back to built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::LOCAL_BASE;
use crate::tools::ToolDefaults;

pub const CONFIG_FILE_NAME: &str = "tradecalc.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL used for share links.
    pub base_url: String,
    /// Where the TUI keeps its last URL. `None` uses the platform config dir.
    pub state_path: Option<PathBuf>,
    pub defaults: ToolDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE.to_string(),
            state_path: None,
            defaults: ToolDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file gives the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
