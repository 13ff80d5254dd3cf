//! Scheduler types.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::download::DispatchError;
use crate::results::{SnapshotError, StatsSnapshot};
use crate::work::{ActiveItem, AggregateRecord, Identifier, IdentifierError, ParsedIdentifiers};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("A run is already in progress")]
    AlreadyRunning,

    /// The download capability could not be initialized.
    #[error("Download capability unavailable: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Failed to persist results: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Input of a run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub identifiers: Vec<Identifier>,
    /// Input tokens rejected while parsing; echoed in the snapshot.
    pub rejected: Vec<IdentifierError>,
}

impl RunRequest {
    pub fn new(identifiers: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            identifiers: identifiers.into_iter().collect(),
            rejected: Vec::new(),
        }
    }
}

impl From<ParsedIdentifiers> for RunRequest {
    fn from(parsed: ParsedIdentifiers) -> Self {
        Self {
            identifiers: parsed.identifiers,
            rejected: parsed.rejected,
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub stats: StatsSnapshot,
    /// Records in emission order.
    pub records: Vec<AggregateRecord>,
    pub interrupted: bool,
    /// Identifiers never launched because of cancellation.
    pub not_started: Vec<Identifier>,
    pub snapshot_path: Option<PathBuf>,
    /// Chunks launched (chunked mode only).
    pub chunks: usize,
}

impl RunSummary {
    /// Identifiers in emission order.
    pub fn emitted_ids(&self) -> Vec<Identifier> {
        self.records.iter().map(|r| r.identifier).collect()
    }

    pub fn record(&self, identifier: Identifier) -> Option<&AggregateRecord> {
        self.records.iter().find(|r| r.identifier == identifier)
    }
}

/// Live scheduler status for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub run_id: Option<String>,
    pub cancelled: bool,
    pub stats: StatsSnapshot,
    pub active: Vec<ActiveItem>,
}
