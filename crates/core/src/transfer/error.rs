//! Error types for the transfer module.

use thiserror::Error;

/// Errors that can occur while running a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transfer program is not installed or not on PATH.
    #[error("Transfer program not found: {program}")]
    ProgramNotFound { program: String },

    /// The subprocess could not be started.
    #[error("Failed to spawn transfer: {reason}")]
    SpawnFailed { reason: String },

    /// The subprocess exited unsuccessfully.
    #[error("Transfer {}", exit_label(.code))]
    ExitStatus { code: Option<i32>, stderr: String },

    /// The transfer exceeded its time limit and was killed.
    #[error("Transfer timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The transfer was cancelled and the subprocess killed.
    #[error("Transfer cancelled")]
    Cancelled,

    /// I/O error around the transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl TransferError {
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Exit code of the subprocess, when it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitStatus { code, .. } => *code,
            _ => None,
        }
    }

    /// Human-readable detail including the stderr tail when present.
    pub fn detail(&self) -> String {
        match self {
            Self::ExitStatus { stderr, .. } if !stderr.is_empty() => {
                format!("{}: {}", self, stderr)
            }
            _ => self.to_string(),
        }
    }
}
