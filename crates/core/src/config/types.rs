use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::download::DownloadConfig;
use crate::extraction::ExtractionConfig;
use crate::report::ReportConfig;
use crate::results::SnapshotConfig;
use crate::scheduler::SchedulerConfig;
use crate::transfer::TransferConfig;
use crate::work::ClassifierConfig;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

/// Optional HTTP status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8787
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Sanitized config for snapshots and API responses (cookie redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub scheduler: SchedulerConfig,
    pub extraction: SanitizedExtractionConfig,
    pub download: DownloadConfig,
    pub transfer: TransferConfig,
    pub classifier: ClassifierConfig,
    pub report: ReportConfig,
    pub snapshot: SnapshotConfig,
    pub status: StatusConfig,
}

/// Extraction config with the session cookie hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedExtractionConfig {
    pub page_url_template: String,
    pub retry_delay_ms: u64,
    pub attempt_timeout_secs: u64,
    pub link_kinds: Vec<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub cookie_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let e = &config.extraction;
        Self {
            scheduler: config.scheduler.clone(),
            extraction: SanitizedExtractionConfig {
                page_url_template: e.page_url_template.clone(),
                retry_delay_ms: e.retry_delay_ms,
                attempt_timeout_secs: e.attempt_timeout_secs,
                link_kinds: e.link_kinds.clone(),
                user_agent: e.user_agent.clone(),
                request_timeout_secs: e.request_timeout_secs,
                cookie_configured: e.cookie.as_deref().is_some_and(|c| !c.is_empty()),
            },
            download: config.download.clone(),
            transfer: config.transfer.clone(),
            classifier: config.classifier.clone(),
            report: config.report.clone(),
            snapshot: config.snapshot.clone(),
            status: config.status.clone(),
        }
    }
}

impl SanitizedConfig {
    /// JSON form embedded in snapshots.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
