//! Types for the transfer module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::work::Identifier;

/// A single file to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub identifier: Identifier,
    pub url: String,
    /// Full destination path.
    pub destination: PathBuf,
}

/// Progress update emitted during a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub identifier: Identifier,
    /// 0.0 to 100.0
    pub percent: f32,
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    pub identifier: Identifier,
    pub destination: PathBuf,
    /// Size of the destination file, 0 if it could not be read.
    pub bytes: u64,
    pub duration_ms: u64,
    pub exit_code: Option<i32>,
}
