//! Trait definitions for the transfer module.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::TransferError;
use super::types::{TransferProgress, TransferReport, TransferRequest};

/// A capability that fetches one URL to a local file.
#[async_trait]
pub trait TransferAgent: Send + Sync {
    /// Returns the name of this agent implementation.
    fn name(&self) -> &str;

    /// Runs the transfer to completion.
    ///
    /// Progress updates are sent on `progress_tx` without blocking; if the
    /// receiver is gone the transfer continues without reporting. When
    /// `cancel` fires, any subprocess is terminated and
    /// [`TransferError::Cancelled`] is returned.
    async fn transfer(
        &self,
        request: TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<TransferReport, TransferError>;

    /// Validates that the agent is properly configured and ready.
    async fn validate(&self) -> Result<(), TransferError>;
}
