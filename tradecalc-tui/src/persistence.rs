//! Last-session state: JSON save/load across restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tradecalc_core::params::LocationStore;
use tradecalc_core::tools::Tool;

use crate::app::App;

pub const STATE_FILE_NAME: &str = "state.json";

/// What the TUI remembers between runs. The URL carries every input, so
/// reopening it restores the forms exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub url: Option<String>,
    pub active_tool: Tool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            url: None,
            active_tool: Tool::PositionSizing,
        }
    }
}

/// `<config dir>/tradecalc/state.json`, unless the config names a path.
pub fn default_path(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(path) => path.to_path_buf(),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tradecalc")
            .join(STATE_FILE_NAME),
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "ignoring corrupt state file");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Where a session starts: an explicit link, else the last session's URL,
/// else the base URL on the last active tool.
pub fn start_location(link: Option<&str>, state: &PersistedState, base_url: &str) -> LocationStore {
    if let Some(link) = link {
        return LocationStore::open(link);
    }
    if let Some(url) = state.url.as_deref() {
        return LocationStore::open(url);
    }
    let mut store = LocationStore::parse(base_url).unwrap_or_else(|err| {
        tracing::warn!(base_url, %err, "invalid base URL, using localhost");
        LocationStore::default()
    });
    store.set_fragment(Some(state.active_tool.route()));
    store
}

pub fn extract(app: &App) -> PersistedState {
    PersistedState {
        url: Some(app.share_url()),
        active_tool: app.tool,
    }
}
