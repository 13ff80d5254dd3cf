//! Configuration for result snapshots.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Snapshot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Whether a snapshot is written at the end of a run.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory snapshots are written to.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File name prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_prefix() -> String {
    "crawl".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            directory: default_directory(),
            prefix: default_prefix(),
        }
    }
}

impl SnapshotConfig {
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }
}
