//! Download dispatch for successful extractions.
//!
//! The `DownloadDispatcher` picks the primary link of an extraction,
//! derives a unique file name per identifier and runs one transfer through a
//! [`TransferAgent`](crate::transfer::TransferAgent), tracking its progress.

mod config;
mod dispatcher;
mod types;

pub use config::DownloadConfig;
pub use dispatcher::{DispatchError, DownloadDispatcher};
pub use types::{DownloadOutcome, DownloadStatus};
