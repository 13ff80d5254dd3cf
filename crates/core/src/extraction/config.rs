//! Configuration for link extraction.

use serde::{Deserialize, Serialize};

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Page URL with an `{id}` placeholder.
    #[serde(default = "default_page_url_template")]
    pub page_url_template: String,

    /// Delay before the single retry, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound for one attempt, in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Link kinds recognized in anchor text, in preference order.
    #[serde(default = "default_link_kinds")]
    pub link_kinds: Vec<String>,

    /// User-Agent header sent with page requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Raw `Cookie` header for sites that require a session.
    #[serde(default)]
    pub cookie: Option<String>,
}

fn default_page_url_template() -> String {
    "https://example.com/episodes/{id}".to_string()
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_attempt_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_link_kinds() -> Vec<String> {
    ["1080p", "720p", "480p", "360p"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_user_agent() -> String {
    format!("reelcrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    20
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            page_url_template: default_page_url_template(),
            retry_delay_ms: default_retry_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            link_kinds: default_link_kinds(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            cookie: None,
        }
    }
}

impl ExtractionConfig {
    /// Set the page URL template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.page_url_template = template.into();
        self
    }

    /// Set the retry delay.
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_attempt_timeout_secs(mut self, secs: u64) -> Self {
        self.attempt_timeout_secs = secs;
        self
    }

    /// Page URL for an identifier.
    pub fn locator_for(&self, identifier: u32) -> String {
        self.page_url_template
            .replace("{id}", &identifier.to_string())
    }
}
