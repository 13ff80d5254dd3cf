//! Transfer module for fetching files with an external program.
//!
//! This module provides the `TransferAgent` trait and `CommandTransferAgent`,
//! which runs a configurable downloader (curl by default) as a subprocess,
//! turns its textual progress output into structured progress events and
//! kills it on cancellation or timeout.

mod command;
mod config;
mod error;
mod traits;
mod types;

pub use command::{parse_percent, CommandTransferAgent};
pub use config::TransferConfig;
pub use error::TransferError;
pub use traits::TransferAgent;
pub use types::{TransferProgress, TransferReport, TransferRequest};
