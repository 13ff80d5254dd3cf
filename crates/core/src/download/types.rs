//! Types for the download module.

use serde::{Deserialize, Serialize};

use crate::work::Identifier;

/// Status of the download stage for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    NotAttempted,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAttempted => "not_attempted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result of the download stage for one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub identifier: Identifier,
    pub status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_kind: Option<String>,
    /// Last reported progress, 0.0 to 100.0.
    #[serde(default)]
    pub progress_percent: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn not_attempted(identifier: Identifier) -> Self {
        Self {
            identifier,
            status: DownloadStatus::NotAttempted,
            local_file_name: None,
            link_kind: None,
            progress_percent: 0.0,
            exit_code: None,
            error: None,
        }
    }

    /// Not attempted, with the reason recorded.
    pub fn skipped(identifier: Identifier, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::not_attempted(identifier)
        }
    }
}
