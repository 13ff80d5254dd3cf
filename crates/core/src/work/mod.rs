//! Work items for a crawl run.
//!
//! A run starts from a set of numeric identifiers (episode numbers). This
//! module parses them from user input, classifies each as canon or filler,
//! and defines the terminal [`AggregateRecord`] every identifier ends in.

mod classifier;
mod config;
mod identifier;
mod tracker;
mod types;

pub use classifier::{Classified, WorkItemClassifier};
pub use config::ClassifierConfig;
pub use identifier::{
    parse_identifier, parse_identifiers, IdentifierError, ParsedIdentifiers,
    DEFAULT_MAX_RANGE_LEN,
};
pub use tracker::{ActiveItem, StateTracker};
pub use types::{AggregateRecord, Classification, Identifier, Outcome, WorkItem, WorkState};
