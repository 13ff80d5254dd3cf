//! Configuration for reporting.

use serde::{Deserialize, Serialize};

/// Reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Emit an aggregate progress line every N records. 0 disables.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

fn default_progress_every() -> u64 {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            progress_every: default_progress_every(),
        }
    }
}
