//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring a reelcrawl run:
//! - HTTP request metrics of the status endpoint
//! - Run progress (collected dynamically from the scheduler)
//! - Core extraction and transfer metrics

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelcrawl_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelcrawl_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

// =============================================================================
// Run Metrics (collected dynamically)
// =============================================================================

/// Scheduler running state (1 = running, 0 = idle).
pub static RUN_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelcrawl_run_active",
        "Whether a crawl run is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Identifiers in the current run.
pub static RUN_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reelcrawl_run_items_total", "Identifiers in the current run").unwrap()
});

/// Identifiers with a terminal record.
pub static RUN_RECORDED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelcrawl_run_items_recorded",
        "Identifiers of the current run with a terminal record",
    )
    .unwrap()
});

/// Items currently in flight by state.
pub static ACTIVE_ITEMS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("reelcrawl_active_items", "Items in flight by state"),
        &["state"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();

    // Run
    registry.register(Box::new(RUN_ACTIVE.clone())).unwrap();
    registry.register(Box::new(RUN_TOTAL.clone())).unwrap();
    registry.register(Box::new(RUN_RECORDED.clone())).unwrap();
    registry.register(Box::new(ACTIVE_ITEMS.clone())).unwrap();

    // Core metrics (extraction, transfers, scheduling)
    for metric in reelcrawl_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from the scheduler before encoding.
pub async fn collect_dynamic_metrics(state: &AppState) {
    let status = state.scheduler().status().await;
    RUN_ACTIVE.set(if status.running { 1 } else { 0 });
    RUN_TOTAL.set(status.stats.total as i64);
    RUN_RECORDED.set(status.stats.recorded as i64);

    ACTIVE_ITEMS.reset();
    for item in &status.active {
        ACTIVE_ITEMS
            .with_label_values(&[&item.state.to_string()])
            .inc();
    }
}

/// Normalize a path for metric labels (replace identifiers with placeholders).
pub fn normalize_path(path: &str) -> String {
    static NUMERIC: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

    NUMERIC.replace_all(path, "/{id}$1").to_string()
}
