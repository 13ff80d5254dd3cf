//! Error types for the extraction module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while extracting links for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionError {
    /// The attempt did not finish in time.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The page exists but holds no usable links, or does not exist.
    #[error("No content found at {locator}")]
    ContentNotFound { locator: String },

    /// The page returned an unexpected HTTP status.
    #[error("HTTP {status} from {locator}")]
    Http { status: u16, locator: String },

    /// Connection-level failure.
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// The page could not be interpreted.
    #[error("Failed to parse page: {reason}")]
    Parse { reason: String },

    /// Extraction was cancelled.
    #[error("Extraction cancelled")]
    Cancelled,

    /// The pipeline task ended abnormally.
    #[error("Extraction aborted: {reason}")]
    Aborted { reason: String },
}

impl ExtractionError {
    pub fn content_not_found(locator: impl Into<String>) -> Self {
        Self::ContentNotFound {
            locator: locator.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Aborted { .. })
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::ContentNotFound { .. } => "content_not_found",
            Self::Http { .. } => "http",
            Self::Transport { .. } => "transport",
            Self::Parse { .. } => "parse",
            Self::Cancelled => "cancelled",
            Self::Aborted { .. } => "aborted",
        }
    }
}
