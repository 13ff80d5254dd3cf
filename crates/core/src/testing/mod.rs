//! Testing utilities and mock implementations.
//!
//! This module provides controllable implementations of the capability
//! traits, so complete runs can be exercised without a network or a
//! downloader installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelcrawl_core::testing::{CollectingSink, MockLinkExtractor, MockTransferAgent};
//!
//! let extractor = Arc::new(MockLinkExtractor::new());
//! extractor.fail_always(4, ExtractionError::content_not_found("p/4")).await;
//!
//! let agent = Arc::new(MockTransferAgent::new());
//! agent.set_behavior(2, TransferBehavior::Hang).await;
//! ```

mod collecting_sink;
mod mock_extractor;
mod mock_transfer;

pub use collecting_sink::CollectingSink;
pub use mock_extractor::MockLinkExtractor;
pub use mock_transfer::{MockTransferAgent, TransferBehavior};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::extraction::LinkSet;
    use crate::work::Identifier;

    /// Drive share URL for an identifier, as a page would publish it.
    pub fn drive_share_url(identifier: Identifier) -> String {
        format!(
            "https://drive.google.com/file/d/episode-{}/view?usp=sharing",
            identifier
        )
    }

    /// Direct download URL `drive_share_url` canonicalizes to.
    pub fn drive_download_url(identifier: Identifier) -> String {
        format!(
            "https://drive.google.com/uc?export=download&id=episode-{}",
            identifier
        )
    }

    /// Default link set published for an identifier.
    pub fn links_for(identifier: Identifier) -> LinkSet {
        let mut links = LinkSet::new();
        links.insert("1080p".to_string(), drive_share_url(identifier));
        links
    }
}
