//! Configuration for the transfer subprocess.

use serde::{Deserialize, Serialize};

/// Transfer subprocess settings.
///
/// Arguments may contain the placeholders `{url}`, `{output}` and `{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Program to run.
    #[serde(default = "default_program")]
    pub program: String,

    /// Program arguments.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Time limit for one transfer, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of stderr lines kept for failure reports.
    #[serde(default = "default_stderr_tail_lines")]
    pub stderr_tail_lines: usize,
}

fn default_program() -> String {
    "curl".to_string()
}

fn default_args() -> Vec<String> {
    ["-L", "--fail", "--progress-bar", "-o", "{output}", "{url}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    7200 // 2 hours
}

fn default_stderr_tail_lines() -> usize {
    20
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
            stderr_tail_lines: default_stderr_tail_lines(),
        }
    }
}

impl TransferConfig {
    /// Create a config for an arbitrary program.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    /// Set the timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
