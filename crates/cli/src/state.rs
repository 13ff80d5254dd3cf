use reelcrawl_core::{Config, CrawlScheduler, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<CrawlScheduler>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<CrawlScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn scheduler(&self) -> &CrawlScheduler {
        self.scheduler.as_ref()
    }
}
