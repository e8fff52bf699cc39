//! reqlens — interactive TUI review workspace for requirements-vs-schema
//! comparison reports.

use std::path::PathBuf;

pub mod api;
pub mod harness;
pub mod model;
pub mod state;
pub mod ui;

/// Data directory for logs and persisted UI state.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "reqlens", "reqlens").map_or_else(
        || PathBuf::from(".reqlens"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}
