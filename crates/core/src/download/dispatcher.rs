//! Hands successful extractions to a transfer agent.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::DownloadConfig;
use super::types::{DownloadOutcome, DownloadStatus};
use crate::extraction::{ExtractionResult, LinkSet};
use crate::metrics;
use crate::transfer::{TransferAgent, TransferError, TransferProgress, TransferRequest};
use crate::work::{Identifier, StateTracker, WorkState};

/// Errors raised by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The extraction holds no link the dispatcher can use.
    #[error("No usable transfer link")]
    NoTransferLink,

    /// The destination directory could not be created.
    #[error("Failed to create destination directory {path}: {source}")]
    DestinationDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The transfer agent is not usable.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Runs one transfer per extraction.
#[derive(Clone)]
pub struct DownloadDispatcher {
    agent: Arc<dyn TransferAgent>,
    config: DownloadConfig,
    tracker: StateTracker,
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

fn sanitize(kind: &str) -> String {
    kind.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl DownloadDispatcher {
    pub fn new(agent: Arc<dyn TransferAgent>, config: DownloadConfig, tracker: StateTracker) -> Self {
        Self {
            agent,
            config,
            tracker,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.auto_download
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Prepares the destination directory and validates the agent.
    pub async fn validate(&self) -> Result<(), DispatchError> {
        let dir = &self.config.destination_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| DispatchError::DestinationDir {
                path: dir.clone(),
                source,
            })?;
        self.agent.validate().await?;
        Ok(())
    }

    /// Picks the primary link: the first preferred kind with an absolute
    /// http(s) URL, or with no preference the first such kind in sorted order.
    pub fn select_link(&self, links: &LinkSet) -> Option<(String, String)> {
        if self.config.preferred_kinds.is_empty() {
            return links
                .iter()
                .find(|(_, url)| is_http_url(url))
                .map(|(k, u)| (k.clone(), u.clone()));
        }

        self.config.preferred_kinds.iter().find_map(|preferred| {
            links
                .iter()
                .find(|(kind, url)| kind.eq_ignore_ascii_case(preferred) && is_http_url(url))
                .map(|(k, u)| (k.clone(), u.clone()))
        })
    }

    /// Destination file name, unique per identifier.
    pub fn file_name_for(&self, identifier: Identifier, kind: &str) -> String {
        format!(
            "{}{:0width$}-{}.{}",
            self.config.file_prefix,
            identifier,
            sanitize(kind),
            self.config.file_extension,
            width = self.config.id_padding
        )
    }

    /// Runs the download stage for one extraction. Never fails; the outcome
    /// carries the error.
    pub async fn dispatch(
        &self,
        extraction: &ExtractionResult,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let identifier = extraction.identifier;
        if !extraction.is_success() {
            return DownloadOutcome::not_attempted(identifier);
        }

        let Some((kind, url)) = self.select_link(&extraction.links) else {
            debug!(identifier, "No usable transfer link");
            return DownloadOutcome::skipped(identifier, DispatchError::NoTransferLink.to_string());
        };

        let file_name = self.file_name_for(identifier, &kind);
        let mut outcome = DownloadOutcome {
            identifier,
            status: DownloadStatus::InProgress,
            local_file_name: Some(file_name.clone()),
            link_kind: Some(kind.clone()),
            ..DownloadOutcome::not_attempted(identifier)
        };

        if cancel.is_cancelled() {
            outcome.status = DownloadStatus::Cancelled;
            outcome.error = Some(TransferError::Cancelled.to_string());
            return outcome;
        }

        let request = TransferRequest {
            identifier,
            url,
            destination: self.config.destination_dir.join(&file_name),
        };

        self.tracker
            .set_state(identifier, WorkState::Downloading)
            .await;
        metrics::TRANSFERS_STARTED.inc();
        info!(identifier, kind = %kind, file = %file_name, "Starting download");

        let started = Instant::now();
        let (progress_tx, mut progress_rx) = mpsc::channel::<TransferProgress>(32);
        let transfer = self
            .agent
            .transfer(request, progress_tx, cancel.clone());
        let drain = async {
            let mut last = 0.0f32;
            while let Some(progress) = progress_rx.recv().await {
                last = progress.percent;
                self.tracker.set_progress(identifier, progress.percent).await;
            }
            last
        };
        let (result, last_percent) = tokio::join!(transfer, drain);
        outcome.progress_percent = last_percent;

        let label = match result {
            Ok(report) => {
                outcome.status = DownloadStatus::Completed;
                outcome.progress_percent = 100.0;
                outcome.exit_code = report.exit_code;
                info!(
                    identifier,
                    bytes = report.bytes,
                    duration_ms = report.duration_ms,
                    "Download completed"
                );
                "completed"
            }
            Err(TransferError::Cancelled) => {
                outcome.status = DownloadStatus::Cancelled;
                outcome.error = Some(TransferError::Cancelled.to_string());
                info!(identifier, "Download cancelled");
                "cancelled"
            }
            Err(e) => {
                outcome.status = DownloadStatus::Failed;
                outcome.exit_code = e.exit_code();
                outcome.error = Some(e.detail());
                warn!(identifier, error = %e, "Download failed");
                "failed"
            }
        };

        metrics::TRANSFERS_FINISHED.with_label_values(&[label]).inc();
        metrics::TRANSFER_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransferAgent, TransferBehavior};

    fn extraction(id: Identifier, links: &[(&str, &str)]) -> ExtractionResult {
        let links = links
            .iter()
            .map(|(k, u)| (k.to_string(), u.to_string()))
            .collect();
        ExtractionResult::succeeded(id, format!("http://pages.test/{}", id), links, 1)
    }

    fn dispatcher(agent: Arc<MockTransferAgent>, dir: &std::path::Path) -> DownloadDispatcher {
        DownloadDispatcher::new(agent, DownloadConfig::enabled(dir), StateTracker::new())
    }

    #[test]
    fn test_select_link_preference_order() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(Arc::new(MockTransferAgent::new()), dir.path());

        let links = extraction(
            1,
            &[
                ("360p", "https://a.example/360.mp4"),
                ("720p", "https://a.example/720.mp4"),
                ("1080p", "magnet:?xt=urn:btih:abc"),
            ],
        )
        .links;
        let (kind, url) = d.select_link(&links).unwrap();
        assert_eq!(kind, "720p");
        assert_eq!(url, "https://a.example/720.mp4");
    }

    #[test]
    fn test_select_link_any_kind_when_unconfigured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DownloadConfig::enabled(dir.path());
        config.preferred_kinds.clear();
        let d = DownloadDispatcher::new(Arc::new(MockTransferAgent::new()), config, StateTracker::new());

        let links = extraction(1, &[("zeta", "https://z.example/z"), ("alpha", "ftp://a.example/a")]).links;
        assert_eq!(d.select_link(&links).unwrap().0, "zeta");
    }

    #[test]
    fn test_http_url_detection() {
        assert!(is_http_url("https://a.example/720.mp4"));
        assert!(is_http_url("HTTP://A.example/720.mp4"));
        assert!(is_http_url(" https://a.example/x "));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("/relative/720.mp4"));
        assert!(!is_http_url("magnet:?xt=urn:btih:abc"));
    }

    #[test]
    fn test_file_name_unique_per_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(Arc::new(MockTransferAgent::new()), dir.path());
        assert_eq!(d.file_name_for(12, "1080p"), "episode-0012-1080p.mp4");
        assert_eq!(d.file_name_for(12345, "hd / 2"), "episode-12345-hd___2.mp4");
        assert_ne!(d.file_name_for(1, "720p"), d.file_name_for(2, "720p"));
    }

    #[tokio::test]
    async fn test_dispatch_completed() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockTransferAgent::new());
        let d = dispatcher(agent.clone(), dir.path());

        let outcome = d
            .dispatch(
                &extraction(3, &[("1080p", "https://cdn.example/3.mp4")]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.status, DownloadStatus::Completed);
        assert_eq!(outcome.progress_percent, 100.0);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.local_file_name.as_deref(), Some("episode-0003-1080p.mp4"));
        assert!(dir.path().join("episode-0003-1080p.mp4").exists());

        let requests = agent.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://cdn.example/3.mp4");
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockTransferAgent::new());
        agent
            .set_behavior(
                4,
                TransferBehavior::FailWithExit {
                    code: 22,
                    stderr: "HTTP 403".to_string(),
                },
            )
            .await;
        let d = dispatcher(agent, dir.path());

        let outcome = d
            .dispatch(
                &extraction(4, &[("720p", "https://cdn.example/4.mp4")]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.status, DownloadStatus::Failed);
        assert_eq!(outcome.exit_code, Some(22));
        assert!(outcome.error.unwrap().contains("HTTP 403"));
    }

    #[tokio::test]
    async fn test_dispatch_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockTransferAgent::new());
        agent.set_behavior(5, TransferBehavior::SpawnFail).await;
        let d = dispatcher(agent, dir.path());

        let outcome = d
            .dispatch(
                &extraction(5, &[("720p", "https://cdn.example/5.mp4")]),
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(outcome.status, DownloadStatus::Failed);
        assert!(outcome.exit_code.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_without_link() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockTransferAgent::new());
        let d = dispatcher(agent.clone(), dir.path());

        let outcome = d
            .dispatch(
                &extraction(6, &[("subtitles", "https://cdn.example/6.srt")]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.status, DownloadStatus::NotAttempted);
        assert_eq!(outcome.error.as_deref(), Some("No usable transfer link"));
        assert!(agent.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockTransferAgent::new());
        agent.set_behavior(7, TransferBehavior::Hang).await;
        let d = dispatcher(agent.clone(), dir.path());
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let outcome = d
            .dispatch(&extraction(7, &[("480p", "https://cdn.example/7.mp4")]), &cancel)
            .await;

        assert_eq!(outcome.status, DownloadStatus::Cancelled);
        assert_eq!(agent.terminated().await, vec![7]);
    }

    #[tokio::test]
    async fn test_validate_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a").join("b");
        let agent = Arc::new(MockTransferAgent::new());
        let d = DownloadDispatcher::new(agent.clone(), DownloadConfig::enabled(&dest), StateTracker::new());

        d.validate().await.unwrap();
        assert!(dest.is_dir());

        agent.set_validate_fails(true).await;
        assert!(matches!(d.validate().await, Err(DispatchError::Transfer(_))));
    }
}
