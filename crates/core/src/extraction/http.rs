//! HTTP page scraper implementation of [`LinkExtractor`].

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{StatusCode, Url};
use tracing::debug;

use super::config::ExtractionConfig;
use super::error::ExtractionError;
use super::traits::LinkExtractor;
use super::types::LinkSet;
use crate::work::Identifier;

static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Fetches an episode page over HTTP and maps its anchors to link kinds.
///
/// An anchor belongs to the first configured kind that appears in its text
/// (or, failing that, in its href). With no kinds configured, the anchor
/// text itself is the kind.
pub struct HttpLinkExtractor {
    client: reqwest::Client,
    kinds: Vec<String>,
}

impl HttpLinkExtractor {
    /// Build the extractor and its HTTP client.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ExtractionError::transport(format!("invalid cookie header: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ExtractionError::transport(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            kinds: config
                .link_kinds
                .iter()
                .map(|k| k.to_ascii_lowercase())
                .collect(),
        })
    }

    fn parse_links(&self, locator: &str, body: &str) -> Result<LinkSet, ExtractionError> {
        let base = Url::parse(locator)
            .map_err(|e| ExtractionError::parse(format!("bad locator {}: {}", locator, e)))?;
        Ok(parse_links(&base, body, &self.kinds))
    }
}

fn anchor_text(raw: &str) -> String {
    let text = TAG.replace_all(raw, " ");
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn parse_links(base: &Url, body: &str, kinds: &[String]) -> LinkSet {
    let mut links = LinkSet::new();

    for captures in ANCHOR.captures_iter(body) {
        let (Some(href), Some(inner)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let href = decode_entities(href.as_str().trim());
        let Ok(url) = base.join(&href) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }

        let text = anchor_text(inner.as_str());
        let lowered_text = text.to_ascii_lowercase();
        let lowered_href = href.to_ascii_lowercase();

        let kind = if kinds.is_empty() {
            (!text.is_empty()).then(|| lowered_text.clone())
        } else {
            kinds
                .iter()
                .find(|k| lowered_text.contains(k.as_str()))
                .or_else(|| kinds.iter().find(|k| lowered_href.contains(k.as_str())))
                .cloned()
        };

        if let Some(kind) = kind {
            links.entry(kind).or_insert_with(|| url.to_string());
        }
    }

    links
}

#[async_trait]
impl LinkExtractor for HttpLinkExtractor {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        identifier: Identifier,
        locator: &str,
    ) -> Result<LinkSet, ExtractionError> {
        debug!(identifier, locator, "Fetching page");

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| ExtractionError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExtractionError::content_not_found(locator));
        }
        if !status.is_success() {
            return Err(ExtractionError::Http {
                status: status.as_u16(),
                locator: locator.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::transport(e.to_string()))?;

        let links = self.parse_links(locator, &body)?;
        if links.is_empty() {
            return Err(ExtractionError::content_not_found(locator));
        }
        Ok(links)
    }
}
