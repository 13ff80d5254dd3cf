//! Crawl scheduler.
//!
//! Drives a run end to end:
//! - Filler items are finalized up front without using a worker slot
//! - Canon items run through extraction and download with at most K
//!   pipelines in flight (fixed chunks by default, or a refilled pool)
//! - Completions flow through one writer loop that owns the reporter and
//!   the result store
//! - Cancellation stops new launches, lets in-flight work settle and
//!   writes an interrupted snapshot

mod config;
mod runner;
mod types;

pub use config::{SchedulerConfig, SchedulingMode, HYPER_DELAY_MS, HYPER_WORKERS};
pub use runner::CrawlScheduler;
pub use types::{RunRequest, RunSummary, SchedulerError, SchedulerStatus};
