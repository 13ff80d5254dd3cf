//! Types for the work module.

use serde::{Deserialize, Serialize};

use crate::download::{DownloadOutcome, DownloadStatus};
use crate::extraction::{ExtractionResult, ExtractionStatus};

/// Numeric work identifier (episode number). Always positive.
pub type Identifier = u32;

/// Whether an identifier is processed or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Processed through extraction (and optionally download).
    Canon,
    /// Skipped; finalized without consuming a worker slot.
    Filler,
}

/// Per-item lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkState {
    Pending,
    Running,
    Retrying,
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl WorkState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for WorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Retrying => "retrying",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A single identifier scheduled in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub identifier: Identifier,
    pub classification: Classification,
    pub state: WorkState,
}

impl WorkItem {
    pub fn new(identifier: Identifier, classification: Classification) -> Self {
        Self {
            identifier,
            classification,
            state: WorkState::Pending,
        }
    }
}

/// Terminal outcome of one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Skipped by classification.
    Filler,
    /// Extraction failed after the retry.
    ExtractFailed,
    /// Extraction succeeded and no download was performed.
    NoDownload,
    /// Extraction succeeded and the download completed.
    Downloaded,
    /// Extraction succeeded and the download failed.
    DownloadFailed,
    /// The item was interrupted by cancellation.
    Cancelled,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Filler,
        Outcome::ExtractFailed,
        Outcome::NoDownload,
        Outcome::Downloaded,
        Outcome::DownloadFailed,
        Outcome::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filler => "filler",
            Self::ExtractFailed => "extract_failed",
            Self::NoDownload => "no_download",
            Self::Downloaded => "downloaded",
            Self::DownloadFailed => "download_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Work state an item ends in for this outcome.
    pub fn final_state(&self) -> WorkState {
        match self {
            Self::Filler | Self::NoDownload | Self::Downloaded => WorkState::Completed,
            Self::ExtractFailed | Self::DownloadFailed => WorkState::Failed,
            Self::Cancelled => WorkState::Cancelled,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal snapshot for one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub identifier: Identifier,
    pub classification: Classification,
    pub outcome: Outcome,
    /// Absent for filler items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionResult>,
    pub download: DownloadOutcome,
    /// Set when the record was produced or flushed during an interrupted run.
    #[serde(default)]
    pub interrupted: bool,
}

impl AggregateRecord {
    /// Record for a skipped filler item.
    pub fn filler(identifier: Identifier) -> Self {
        Self {
            identifier,
            classification: Classification::Filler,
            outcome: Outcome::Filler,
            extraction: None,
            download: DownloadOutcome::not_attempted(identifier),
            interrupted: false,
        }
    }

    /// Combines the extraction and download stages into a record.
    ///
    /// The outcome is derived from the two stage results: a failed
    /// extraction wins over anything else, and a cancelled stage yields
    /// [`Outcome::Cancelled`].
    pub fn from_stages(extraction: ExtractionResult, download: DownloadOutcome) -> Self {
        let outcome = match (extraction.status, download.status) {
            (ExtractionStatus::Cancelled, _) => Outcome::Cancelled,
            (ExtractionStatus::Failed, _) => Outcome::ExtractFailed,
            (ExtractionStatus::Succeeded, DownloadStatus::Completed) => Outcome::Downloaded,
            (ExtractionStatus::Succeeded, DownloadStatus::Failed) => Outcome::DownloadFailed,
            (ExtractionStatus::Succeeded, DownloadStatus::Cancelled) => Outcome::Cancelled,
            (ExtractionStatus::Succeeded, DownloadStatus::NotAttempted)
            | (ExtractionStatus::Succeeded, DownloadStatus::InProgress) => Outcome::NoDownload,
        };

        Self {
            identifier: extraction.identifier,
            classification: Classification::Canon,
            outcome,
            extraction: Some(extraction),
            download,
            interrupted: outcome == Outcome::Cancelled,
        }
    }

    /// Record for a pipeline that failed outside its own error handling
    /// (for example a panicked task).
    pub fn failed(identifier: Identifier, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            identifier,
            classification: Classification::Canon,
            outcome: Outcome::ExtractFailed,
            extraction: Some(ExtractionResult::aborted(identifier, reason)),
            download: DownloadOutcome::not_attempted(identifier),
            interrupted: false,
        }
    }

    /// Final work state for this record.
    pub fn state(&self) -> WorkState {
        self.outcome.final_state()
    }
}
