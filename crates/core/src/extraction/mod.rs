//! Link extraction for work items.
//!
//! This module provides the `LinkExtractor` trait, the `ExtractionPipeline`
//! that wraps it with a single retry and URL canonicalization, and the
//! `HttpLinkExtractor` that scrapes anchors from an episode page.
//!
//! # Example
//!
//! ```ignore
//! use reelcrawl_core::extraction::{ExtractionConfig, ExtractionPipeline, HttpLinkExtractor};
//!
//! let config = ExtractionConfig::default();
//! let extractor = Arc::new(HttpLinkExtractor::new(&config)?);
//! let pipeline = ExtractionPipeline::new(extractor, config, StateTracker::new());
//!
//! let result = pipeline.run(12, &CancellationToken::new()).await;
//! for (kind, url) in &result.links {
//!     println!("{kind}: {url}");
//! }
//! ```

mod canonical;
mod config;
mod error;
mod http;
mod pipeline;
mod traits;
mod types;

pub use canonical::{canonicalize_links, canonicalize_url, is_drive_url};
pub use config::ExtractionConfig;
pub(crate) use config::default_link_kinds;
pub use error::ExtractionError;
pub use http::HttpLinkExtractor;
pub use pipeline::{ExtractionPipeline, MAX_ATTEMPTS};
pub use traits::LinkExtractor;
pub use types::{ExtractionResult, ExtractionStatus, LinkSet};
