//! Types for the extraction module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ExtractionError;
use crate::work::Identifier;

/// Link kind (for example `"1080p"`) to URL.
pub type LinkSet = BTreeMap<String, String>;

/// Final status of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Result of running the extraction pipeline for one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub identifier: Identifier,
    /// Page URL that was fetched.
    pub locator: String,
    /// Canonicalized links. May be partial.
    pub links: LinkSet,
    pub status: ExtractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractionError>,
    /// Number of attempts made (0 when cancelled before the first).
    pub attempts: u8,
}

impl ExtractionResult {
    pub fn succeeded(
        identifier: Identifier,
        locator: impl Into<String>,
        links: LinkSet,
        attempts: u8,
    ) -> Self {
        Self {
            identifier,
            locator: locator.into(),
            links,
            status: ExtractionStatus::Succeeded,
            error: None,
            attempts,
        }
    }

    pub fn failed(
        identifier: Identifier,
        locator: impl Into<String>,
        error: ExtractionError,
        attempts: u8,
    ) -> Self {
        let status = if error == ExtractionError::Cancelled {
            ExtractionStatus::Cancelled
        } else {
            ExtractionStatus::Failed
        };
        Self {
            identifier,
            locator: locator.into(),
            links: LinkSet::new(),
            status,
            error: Some(error),
            attempts,
        }
    }

    /// Result for a pipeline that never returned normally.
    pub fn aborted(identifier: Identifier, reason: impl Into<String>) -> Self {
        Self::failed(
            identifier,
            String::new(),
            ExtractionError::Aborted {
                reason: reason.into(),
            },
            0,
        )
    }

    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Succeeded
    }
}
