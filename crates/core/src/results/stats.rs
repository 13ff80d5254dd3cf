//! Live run statistics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::download::DownloadStatus;
use crate::extraction::ExtractionStatus;
use crate::metrics;
use crate::work::{AggregateRecord, Classification, Outcome};

/// Atomic counters over recorded items.
///
/// Written by the run's writer loop, read concurrently by the status
/// endpoint.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    total: AtomicU64,
    recorded: AtomicU64,
    extraction_succeeded: AtomicU64,
    extraction_failed: AtomicU64,
    filler_skipped: AtomicU64,
    download_completed: AtomicU64,
    download_failed: AtomicU64,
    download_cancelled: AtomicU64,
    download_not_attempted: AtomicU64,
    outcomes: [AtomicU64; Outcome::ALL.len()],
}

/// Point-in-time copy of [`StatsAggregator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub recorded: u64,
    pub extraction_succeeded: u64,
    pub extraction_failed: u64,
    pub filler_skipped: u64,
    pub download_completed: u64,
    pub download_failed: u64,
    pub download_cancelled: u64,
    pub download_not_attempted: u64,
    /// Records per outcome.
    pub outcomes: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    pub fn outcome(&self, outcome: Outcome) -> u64 {
        self.outcomes.get(outcome.as_str()).copied().unwrap_or(0)
    }

    pub fn outcome_sum(&self) -> u64 {
        self.outcomes.values().sum()
    }

    /// Whether the per-outcome tally accounts for every recorded item.
    pub fn is_balanced(&self) -> bool {
        self.outcome_sum() == self.recorded
    }
}

fn outcome_index(outcome: Outcome) -> usize {
    Outcome::ALL
        .iter()
        .position(|o| *o == outcome)
        .unwrap_or_default()
}

impl StatsAggregator {
    pub fn new(total: u64) -> Self {
        let stats = Self::default();
        stats.total.store(total, Ordering::Relaxed);
        stats
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Zeroes every counter and sets a new total.
    pub fn reset(&self, total: u64) {
        let counters = [
            &self.recorded,
            &self.extraction_succeeded,
            &self.extraction_failed,
            &self.filler_skipped,
            &self.download_completed,
            &self.download_failed,
            &self.download_cancelled,
            &self.download_not_attempted,
        ];
        for counter in counters.into_iter().chain(self.outcomes.iter()) {
            counter.store(0, Ordering::Relaxed);
        }
        self.set_total(total);
    }

    /// Counts one terminal record.
    pub fn record(&self, record: &AggregateRecord) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        self.outcomes[outcome_index(record.outcome)].fetch_add(1, Ordering::Relaxed);
        metrics::ITEMS_RECORDED
            .with_label_values(&[record.outcome.as_str()])
            .inc();

        if record.classification == Classification::Filler {
            self.filler_skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        match record.extraction.as_ref().map(|e| e.status) {
            Some(ExtractionStatus::Succeeded) => {
                self.extraction_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Some(ExtractionStatus::Failed) => {
                self.extraction_failed.fetch_add(1, Ordering::Relaxed);
            }
            Some(ExtractionStatus::Cancelled) | None => {}
        }

        let counter = match record.download.status {
            DownloadStatus::Completed => &self.download_completed,
            DownloadStatus::Failed => &self.download_failed,
            DownloadStatus::Cancelled => &self.download_cancelled,
            DownloadStatus::NotAttempted | DownloadStatus::InProgress => {
                &self.download_not_attempted
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            total: load(&self.total),
            recorded: load(&self.recorded),
            extraction_succeeded: load(&self.extraction_succeeded),
            extraction_failed: load(&self.extraction_failed),
            filler_skipped: load(&self.filler_skipped),
            download_completed: load(&self.download_completed),
            download_failed: load(&self.download_failed),
            download_cancelled: load(&self.download_cancelled),
            download_not_attempted: load(&self.download_not_attempted),
            outcomes: Outcome::ALL
                .iter()
                .zip(&self.outcomes)
                .map(|(o, c)| (o.as_str().to_string(), load(c)))
                .collect(),
        }
    }
}
