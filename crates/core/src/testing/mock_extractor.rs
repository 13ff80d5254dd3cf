//! Mock link extractor for testing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::fixtures;
use crate::extraction::{ExtractionError, LinkExtractor, LinkSet};
use crate::work::Identifier;

struct ActiveGuard<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn enter(active: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock implementation of the LinkExtractor trait.
///
/// Provides controllable behavior for testing:
/// - Per-identifier link sets (default: one Drive share link per identifier)
/// - Scripted failures, either for the first N calls or always
/// - Global and per-identifier latency
/// - Call recording and peak concurrency tracking
#[derive(Default)]
pub struct MockLinkExtractor {
    links: Arc<RwLock<HashMap<Identifier, LinkSet>>>,
    /// Errors returned by the next calls, consumed front first.
    scripted: Arc<RwLock<HashMap<Identifier, VecDeque<ExtractionError>>>>,
    always_fail: Arc<RwLock<HashMap<Identifier, ExtractionError>>>,
    panics: Arc<RwLock<HashSet<Identifier>>>,
    delay: Arc<RwLock<Duration>>,
    delays: Arc<RwLock<HashMap<Identifier, Duration>>>,
    calls: Arc<RwLock<Vec<(Identifier, String)>>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    shut_down: AtomicBool,
}

impl MockLinkExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links returned for `identifier`.
    pub async fn set_links(&self, identifier: Identifier, links: LinkSet) {
        self.links.write().await.insert(identifier, links);
    }

    /// Fail the next `times` calls for `identifier` with `error`.
    pub async fn fail_times(&self, identifier: Identifier, times: usize, error: ExtractionError) {
        self.scripted
            .write()
            .await
            .entry(identifier)
            .or_default()
            .extend(std::iter::repeat(error).take(times));
    }

    /// Fail the next calls for `identifier` with these errors, in order.
    pub async fn fail_sequence(&self, identifier: Identifier, errors: Vec<ExtractionError>) {
        self.scripted
            .write()
            .await
            .entry(identifier)
            .or_default()
            .extend(errors);
    }

    /// Fail every call for `identifier`.
    pub async fn fail_always(&self, identifier: Identifier, error: ExtractionError) {
        self.always_fail.write().await.insert(identifier, error);
    }

    /// Panic inside `fetch` for `identifier`.
    pub async fn panic_on(&self, identifier: Identifier) {
        self.panics.write().await.insert(identifier);
    }

    /// Latency of every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Latency for one identifier, overriding the global delay.
    pub async fn set_delay_for(&self, identifier: Identifier, delay: Duration) {
        self.delays.write().await.insert(identifier, delay);
    }

    /// Recorded calls as (identifier, locator).
    pub async fn calls(&self) -> Vec<(Identifier, String)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn calls_for(&self, identifier: Identifier) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id == identifier)
            .count()
    }

    /// Highest number of concurrent `fetch` calls observed.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkExtractor for MockLinkExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        identifier: Identifier,
        locator: &str,
    ) -> Result<LinkSet, ExtractionError> {
        self.calls
            .write()
            .await
            .push((identifier, locator.to_string()));
        let _guard = ActiveGuard::enter(&self.active, &self.max_active);

        let delay = match self.delays.read().await.get(&identifier) {
            Some(d) => *d,
            None => *self.delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.read().await.contains(&identifier) {
            panic!("mock extractor panic for identifier {}", identifier);
        }
        if let Some(error) = self.always_fail.read().await.get(&identifier) {
            return Err(error.clone());
        }
        if let Some(error) = self
            .scripted
            .write()
            .await
            .get_mut(&identifier)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        Ok(self
            .links
            .read()
            .await
            .get(&identifier)
            .cloned()
            .unwrap_or_else(|| fixtures::links_for(identifier)))
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}
