//! Trait definitions for the extraction module.

use async_trait::async_trait;

use super::error::ExtractionError;
use super::types::LinkSet;
use crate::work::Identifier;

/// A capability that fetches the transfer links published for an identifier.
///
/// One instance is shared by every pipeline of a run, so implementations
/// must tolerate concurrent calls.
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches the page at `locator` and returns its links keyed by kind.
    ///
    /// URLs are returned as found; canonicalization is done by the caller.
    async fn fetch(&self, identifier: Identifier, locator: &str)
        -> Result<LinkSet, ExtractionError>;

    /// Releases shared resources. Called once at the end of a run.
    async fn shutdown(&self) {}
}
