//! Run statistics and persisted results.
//!
//! - `StatsAggregator` keeps live atomic counters over recorded items.
//! - `ResultStore` is the append-only map of terminal records.
//! - `SnapshotWriter` persists a run as one JSON document.

mod config;
mod snapshot;
mod stats;
mod store;

pub use config::SnapshotConfig;
pub use snapshot::{
    config_hash, read_snapshot, RejectedToken, RunSnapshot, SnapshotError, SnapshotMetadata,
    SnapshotWriter,
};
pub use stats::{StatsAggregator, StatsSnapshot};
pub use store::{ResultStore, StoreError};
