//! JSON snapshot of a finished (or interrupted) run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use super::config::SnapshotConfig;
use super::stats::StatsSnapshot;
use crate::work::{AggregateRecord, Identifier, IdentifierError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An input token that was rejected before the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedToken {
    pub token: String,
    pub reason: String,
}

impl From<&IdentifierError> for RejectedToken {
    fn from(err: &IdentifierError) -> Self {
        match err {
            IdentifierError::InvalidIdentifier { token, reason } => Self {
                token: token.clone(),
                reason: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub interrupted: bool,
    pub totals: StatsSnapshot,
    /// Sanitized configuration the run used.
    pub config: serde_json::Value,
    pub config_hash: String,
    #[serde(default)]
    pub rejected: Vec<RejectedToken>,
    /// Identifiers that were never started (interrupted runs only).
    #[serde(default)]
    pub not_started: Vec<Identifier>,
}

/// One persisted run. Records serialize with keys in ascending numeric
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub metadata: SnapshotMetadata,
    pub records: BTreeMap<Identifier, AggregateRecord>,
}

/// SHA-256 of the canonical JSON form of a configuration echo.
pub fn config_hash(config: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Writes run snapshots into a directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    config: SnapshotConfig,
}

impl SnapshotWriter {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// File path for a snapshot generated at `at`.
    pub fn path_for(&self, at: DateTime<Utc>, interrupted: bool) -> PathBuf {
        let suffix = if interrupted { "-interrupted" } else { "" };
        let name = format!(
            "{}-{}{}.json",
            self.config.prefix,
            at.format("%Y%m%dT%H%M%S%3fZ"),
            suffix
        );
        self.config.directory.join(name)
    }

    /// Writes the snapshot and returns its path.
    ///
    /// The document is written to a temporary file and renamed into place.
    pub async fn write(&self, snapshot: &RunSnapshot) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(snapshot.metadata.generated_at, snapshot.metadata.interrupted);
        let json = serde_json::to_vec_pretty(snapshot)?;

        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| SnapshotError::Write { path, source }
        };

        tokio::fs::create_dir_all(&self.config.directory)
            .await
            .map_err(write_err(&self.config.directory))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(write_err(&tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(write_err(&path))?;

        info!(
            path = %path.display(),
            records = snapshot.records.len(),
            interrupted = snapshot.metadata.interrupted,
            "Snapshot written"
        );
        Ok(path)
    }
}

/// Reads a snapshot back from disk.
pub async fn read_snapshot(path: impl AsRef<Path>) -> Result<RunSnapshot, SnapshotError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}
