//! Persisted UI state.
//!
//! Pane widths and the last active view survive across sessions in a small
//! JSON file under the data dir. Missing or corrupt state falls back to
//! defaults; save failures are logged and otherwise ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const STATE_FILE_NAME: &str = "tui_state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedUiState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub sidebar_width: Option<u16>,
    #[serde(default)]
    pub right_width: Option<u16>,
    #[serde(default)]
    pub last_view: Option<String>,
}

impl Default for PersistedUiState {
    fn default() -> Self {
        Self {
            version: 1,
            sidebar_width: None,
            right_width: None,
            last_view: None,
        }
    }
}

impl PersistedUiState {
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(STATE_FILE_NAME)
    }

    pub fn load(data_dir: &Path) -> Self {
        let path = Self::path_in(data_dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, data_dir: &Path) {
        if let Err(e) = std::fs::create_dir_all(data_dir) {
            warn!("ui state: creating data dir failed: {e}");
            return;
        }
        let path = Self::path_in(data_dir);
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("ui state: write failed: {e}");
                }
            }
            Err(e) => warn!("ui state: serialize failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let state = PersistedUiState {
            version: 1,
            sidebar_width: Some(34),
            right_width: Some(50),
            last_view: Some("reports".into()),
        };
        state.save(dir.path());
        let loaded = PersistedUiState::load(dir.path());
        assert_eq!(loaded.sidebar_width, Some(34));
        assert_eq!(loaded.right_width, Some(50));
        assert_eq!(loaded.last_view.as_deref(), Some("reports"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = PersistedUiState::load(dir.path());
        assert_eq!(loaded.sidebar_width, None);
        assert_eq!(loaded.last_view, None);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(PersistedUiState::path_in(dir.path()), "not json").unwrap();
        let loaded = PersistedUiState::load(dir.path());
        assert_eq!(loaded.right_width, None);
    }
}
