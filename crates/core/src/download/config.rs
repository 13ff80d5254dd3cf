//! Configuration for downloads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extraction::default_link_kinds;

/// Download settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Whether successful extractions are downloaded.
    #[serde(default)]
    pub auto_download: bool,

    /// Directory downloads are written to.
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Link kinds in order of preference. Empty accepts any kind.
    #[serde(default = "default_link_kinds")]
    pub preferred_kinds: Vec<String>,

    /// File name prefix.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// File extension, without the dot.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Zero padding width for the identifier in file names.
    #[serde(default = "default_id_padding")]
    pub id_padding: usize,
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_file_prefix() -> String {
    "episode-".to_string()
}

fn default_file_extension() -> String {
    "mp4".to_string()
}

fn default_id_padding() -> usize {
    4
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            auto_download: false,
            destination_dir: default_destination_dir(),
            preferred_kinds: default_link_kinds(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            id_padding: default_id_padding(),
        }
    }
}

impl DownloadConfig {
    /// Enabled config writing to `destination_dir`.
    pub fn enabled(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            auto_download: true,
            destination_dir: destination_dir.into(),
            ..Default::default()
        }
    }
}
