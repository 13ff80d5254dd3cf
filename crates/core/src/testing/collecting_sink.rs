//! Report sink that keeps everything it receives.

use std::sync::Mutex;

use crate::report::ReportSink;
use crate::results::StatsSnapshot;
use crate::work::{AggregateRecord, Identifier};

/// Collects released records and progress snapshots for assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<AggregateRecord>>,
    progress: Mutex<Vec<StatsSnapshot>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AggregateRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Identifiers in the order they were received.
    pub fn ids(&self) -> Vec<Identifier> {
        self.records().iter().map(|r| r.identifier).collect()
    }

    /// Progress snapshots in the order they were received.
    pub fn progress_snapshots(&self) -> Vec<StatsSnapshot> {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl ReportSink for CollectingSink {
    fn record(&self, record: &AggregateRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }

    fn progress(&self, stats: &StatsSnapshot) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.push(stats.clone());
        }
    }
}
