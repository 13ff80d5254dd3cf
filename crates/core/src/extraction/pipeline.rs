//! Extraction with a single retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::canonical::canonicalize_links;
use super::config::ExtractionConfig;
use super::error::ExtractionError;
use super::traits::LinkExtractor;
use super::types::{ExtractionResult, LinkSet};
use crate::metrics;
use crate::work::{Identifier, StateTracker, WorkState};

/// Attempts per identifier: the first call plus one retry.
pub const MAX_ATTEMPTS: u8 = 2;

/// Runs a [`LinkExtractor`] for one identifier with retry, timeout and
/// canonicalization. Never returns an error; failures are carried in the
/// [`ExtractionResult`].
#[derive(Clone)]
pub struct ExtractionPipeline {
    extractor: Arc<dyn LinkExtractor>,
    config: ExtractionConfig,
    tracker: StateTracker,
}

impl ExtractionPipeline {
    pub fn new(
        extractor: Arc<dyn LinkExtractor>,
        config: ExtractionConfig,
        tracker: StateTracker,
    ) -> Self {
        Self {
            extractor,
            config,
            tracker,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Releases the shared extractor.
    pub async fn shutdown(&self) {
        self.extractor.shutdown().await;
    }

    /// Extract links for `identifier`.
    pub async fn run(&self, identifier: Identifier, cancel: &CancellationToken) -> ExtractionResult {
        let locator = self.config.locator_for(identifier);

        if cancel.is_cancelled() {
            return ExtractionResult::failed(identifier, locator, ExtractionError::Cancelled, 0);
        }

        self.tracker.set_state(identifier, WorkState::Running).await;
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut attempts = 0u8;

        loop {
            attempts += 1;
            let started = Instant::now();
            let result = self.attempt(identifier, &locator, cancel).await;
            let label = match &result {
                Ok(_) => "success",
                Err(e) => e.label(),
            };
            metrics::EXTRACTION_ATTEMPTS.with_label_values(&[label]).inc();
            metrics::EXTRACTION_DURATION
                .with_label_values(&[label])
                .observe(started.elapsed().as_secs_f64());

            match result {
                Ok(links) => {
                    let links = canonicalize_links(links);
                    debug!(identifier, attempts, links = links.len(), "Extraction succeeded");
                    return ExtractionResult::succeeded(identifier, locator, links, attempts);
                }
                Err(ExtractionError::Cancelled) => {
                    info!(identifier, "Extraction cancelled");
                    return ExtractionResult::failed(
                        identifier,
                        locator,
                        ExtractionError::Cancelled,
                        attempts,
                    );
                }
                Err(e) if attempts < MAX_ATTEMPTS && e.is_retryable() => {
                    warn!(identifier, error = %e, "Extraction failed, retrying");
                    metrics::EXTRACTION_RETRIES.inc();
                    self.tracker.set_state(identifier, WorkState::Retrying).await;

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return ExtractionResult::failed(
                                identifier,
                                locator,
                                ExtractionError::Cancelled,
                                attempts,
                            );
                        }
                        _ = tokio::time::sleep(retry_delay) => {}
                    }

                    self.tracker.set_state(identifier, WorkState::Running).await;
                }
                Err(e) => {
                    warn!(identifier, attempts, error = %e, "Extraction failed");
                    return ExtractionResult::failed(identifier, locator, e, attempts);
                }
            }
        }
    }

    async fn attempt(
        &self,
        identifier: Identifier,
        locator: &str,
        cancel: &CancellationToken,
    ) -> Result<LinkSet, ExtractionError> {
        let timeout_secs = self.config.attempt_timeout_secs;
        let fetch = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.extractor.fetch(identifier, locator),
        );

        let links = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractionError::Cancelled),
            result = fetch => match result {
                Ok(inner) => inner?,
                Err(_) => return Err(ExtractionError::Timeout { timeout_secs }),
            },
        };

        if links.is_empty() {
            return Err(ExtractionError::content_not_found(locator));
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionStatus;
    use crate::testing::MockLinkExtractor;

    fn pipeline(extractor: Arc<MockLinkExtractor>) -> ExtractionPipeline {
        let config = ExtractionConfig::default()
            .with_template("http://pages.test/ep/{id}")
            .with_retry_delay_ms(10);
        ExtractionPipeline::new(extractor, config, StateTracker::new())
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let extractor = Arc::new(MockLinkExtractor::new());
        let result = pipeline(extractor.clone())
            .run(5, &CancellationToken::new())
            .await;

        assert_eq!(result.status, ExtractionStatus::Succeeded);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.locator, "http://pages.test/ep/5");
        // Mock links are Drive share URLs; they come back canonical.
        assert_eq!(
            result.links["1080p"],
            "https://drive.google.com/uc?export=download&id=episode-5"
        );
        assert_eq!(extractor.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let extractor = Arc::new(MockLinkExtractor::new());
        extractor
            .fail_times(3, 1, ExtractionError::Timeout { timeout_secs: 30 })
            .await;

        let result = pipeline(extractor.clone())
            .run(3, &CancellationToken::new())
            .await;

        assert!(result.is_success());
        assert_eq!(result.attempts, 2);
        assert!(result.error.is_none());
        assert_eq!(extractor.calls_for(3).await, 2);
    }

    #[tokio::test]
    async fn test_two_failures_carry_retry_error() {
        let extractor = Arc::new(MockLinkExtractor::new());
        extractor
            .fail_sequence(
                9,
                vec![
                    ExtractionError::Timeout { timeout_secs: 30 },
                    ExtractionError::content_not_found("http://pages.test/ep/9"),
                ],
            )
            .await;

        let result = pipeline(extractor.clone())
            .run(9, &CancellationToken::new())
            .await;

        assert_eq!(result.status, ExtractionStatus::Failed);
        assert_eq!(result.attempts, 2);
        assert!(matches!(
            result.error,
            Some(ExtractionError::ContentNotFound { .. })
        ));
        assert_eq!(extractor.calls_for(9).await, 2);
    }

    #[tokio::test]
    async fn test_empty_links_treated_as_not_found() {
        let extractor = Arc::new(MockLinkExtractor::new());
        extractor.set_links(4, LinkSet::new()).await;

        let result = pipeline(extractor.clone())
            .run(4, &CancellationToken::new())
            .await;

        assert_eq!(result.status, ExtractionStatus::Failed);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let extractor = Arc::new(MockLinkExtractor::new());
        extractor.set_delay(Duration::from_millis(1500)).await;
        let config = ExtractionConfig::default()
            .with_retry_delay_ms(1)
            .with_attempt_timeout_secs(1);
        let pipeline = ExtractionPipeline::new(extractor, config, StateTracker::new());

        let result = pipeline.run(1, &CancellationToken::new()).await;
        assert_eq!(result.attempts, 2);
        assert_eq!(
            result.error,
            Some(ExtractionError::Timeout { timeout_secs: 1 })
        );
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let extractor = Arc::new(MockLinkExtractor::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline(extractor.clone()).run(2, &cancel).await;
        assert_eq!(result.status, ExtractionStatus::Cancelled);
        assert_eq!(result.attempts, 0);
        assert_eq!(extractor.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_does_not_retry() {
        let extractor = Arc::new(MockLinkExtractor::new());
        extractor.set_delay(Duration::from_secs(10)).await;
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = pipeline(extractor.clone()).run(2, &cancel).await;
        assert_eq!(result.status, ExtractionStatus::Cancelled);
        assert_eq!(result.attempts, 1);
        assert_eq!(extractor.calls_for(2).await, 1);
    }
}
