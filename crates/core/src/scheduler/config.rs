//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker budget in hyper mode.
pub const HYPER_WORKERS: usize = 12;

/// Inter-chunk delay in hyper mode, in milliseconds.
pub const HYPER_DELAY_MS: u64 = 200;

/// How pending items are handed to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Fixed chunks of K items; each chunk settles fully before the next
    /// starts, after the inter-chunk delay.
    #[default]
    Chunked,
    /// A pool of K workers refilled as soon as any item finishes.
    Dynamic,
}

impl std::fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunked => f.write_str("chunked"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Configuration for the crawl scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Concurrent pipelines (K).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause between chunks (milliseconds).
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,

    /// Hyper mode: 12 workers and a 200 ms inter-chunk delay,
    /// overriding `workers` and `inter_chunk_delay_ms`.
    #[serde(default)]
    pub hyper: bool,

    #[serde(default)]
    pub mode: SchedulingMode,
}

fn default_workers() -> usize {
    8
}

fn default_inter_chunk_delay_ms() -> u64 {
    500
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
            hyper: false,
            mode: SchedulingMode::default(),
        }
    }
}

impl SchedulerConfig {
    /// Worker budget after applying hyper mode. Never zero.
    pub fn effective_workers(&self) -> usize {
        if self.hyper {
            HYPER_WORKERS
        } else {
            self.workers.max(1)
        }
    }

    /// Inter-chunk delay after applying hyper mode.
    pub fn effective_delay(&self) -> Duration {
        if self.hyper {
            Duration::from_millis(HYPER_DELAY_MS)
        } else {
            Duration::from_millis(self.inter_chunk_delay_ms)
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_chunk_delay_ms = delay_ms;
        self
    }

    pub fn with_mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_hyper(mut self, hyper: bool) -> Self {
        self.hyper = hyper;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.effective_workers(), 8);
        assert_eq!(config.effective_delay(), Duration::from_millis(500));
        assert_eq!(config.mode, SchedulingMode::Chunked);
    }

    #[test]
    fn test_hyper_overrides() {
        let config = SchedulerConfig::default().with_workers(3).with_hyper(true);
        assert_eq!(config.effective_workers(), 12);
        assert_eq!(config.effective_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(SchedulerConfig::default().with_workers(0).effective_workers(), 1);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: SchedulerConfig = toml::from_str(r#"mode = "dynamic""#).unwrap();
        assert_eq!(config.mode, SchedulingMode::Dynamic);
        assert_eq!(config.workers, 8);
    }
}
