//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Extraction (attempts, retries, durations)
//! - Transfers (started, finished, durations)
//! - Scheduling and recorded outcomes

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Extraction
// =============================================================================

/// Extraction attempts by result.
pub static EXTRACTION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelcrawl_extraction_attempts_total",
            "Total link extraction attempts",
        ),
        &["result"], // "success", or an error label such as "timeout"
    )
    .unwrap()
});

/// Extraction retries.
pub static EXTRACTION_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelcrawl_extraction_retries_total",
        "Extractions retried after a failed first attempt",
    )
    .unwrap()
});

/// Duration of a single extraction attempt in seconds.
pub static EXTRACTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelcrawl_extraction_duration_seconds",
            "Duration of one extraction attempt",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Transfers
// =============================================================================

/// Transfers started.
pub static TRANSFERS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelcrawl_transfers_started_total", "Transfers started").unwrap()
});

/// Transfers finished by result.
pub static TRANSFERS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelcrawl_transfers_finished_total", "Transfers finished"),
        &["result"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Transfer duration in seconds.
pub static TRANSFER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelcrawl_transfer_duration_seconds",
            "Duration of a transfer subprocess",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Scheduling
// =============================================================================

/// Chunks launched by the chunked scheduler.
pub static CHUNKS_LAUNCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelcrawl_chunks_launched_total", "Worker chunks launched").unwrap()
});

/// Terminal records by outcome.
pub static ITEMS_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelcrawl_items_recorded_total", "Terminal records by outcome"),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(EXTRACTION_ATTEMPTS.clone()),
        Box::new(EXTRACTION_RETRIES.clone()),
        Box::new(EXTRACTION_DURATION.clone()),
        Box::new(TRANSFERS_STARTED.clone()),
        Box::new(TRANSFERS_FINISHED.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        Box::new(CHUNKS_LAUNCHED.clone()),
        Box::new(ITEMS_RECORDED.clone()),
    ]
}
