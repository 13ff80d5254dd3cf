//! Canon / filler classification.

use std::collections::BTreeSet;

use super::config::ClassifierConfig;
use super::identifier::{parse_identifiers, IdentifierError};
use super::types::{Classification, Identifier, WorkItem, WorkState};

/// Result of classifying a set of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Filler items, already finalized as completed. Ascending.
    pub skip: Vec<WorkItem>,
    /// Canon items awaiting a worker. Ascending.
    pub process: Vec<WorkItem>,
}

impl Classified {
    pub fn len(&self) -> usize {
        self.skip.len() + self.process.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_empty() && self.process.is_empty()
    }

    pub fn process_ids(&self) -> Vec<Identifier> {
        self.process.iter().map(|i| i.identifier).collect()
    }
}

/// Splits identifiers into skip and process sets using a static filler set.
///
/// Classification depends only on the filler set, never on scheduling.
#[derive(Debug, Clone, Default)]
pub struct WorkItemClassifier {
    filler: BTreeSet<Identifier>,
}

impl WorkItemClassifier {
    pub fn new(filler: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            filler: filler.into_iter().collect(),
        }
    }

    /// Build from configuration. Fails on the first invalid filler token.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, IdentifierError> {
        let parsed = parse_identifiers(&config.filler, config.max_range_len);
        if let Some(err) = parsed.rejected.into_iter().next() {
            return Err(err);
        }
        Ok(Self::new(parsed.identifiers))
    }

    pub fn is_filler(&self, identifier: Identifier) -> bool {
        self.filler.contains(&identifier)
    }

    pub fn classification_of(&self, identifier: Identifier) -> Classification {
        if self.is_filler(identifier) {
            Classification::Filler
        } else {
            Classification::Canon
        }
    }

    /// Classify identifiers. Input duplicates are collapsed and both
    /// outputs are ascending.
    pub fn classify(&self, identifiers: &[Identifier]) -> Classified {
        let unique: BTreeSet<Identifier> = identifiers.iter().copied().collect();
        let mut classified = Classified::default();

        for identifier in unique {
            match self.classification_of(identifier) {
                Classification::Filler => {
                    let mut item = WorkItem::new(identifier, Classification::Filler);
                    item.state = WorkState::Completed;
                    classified.skip.push(item);
                }
                Classification::Canon => {
                    classified
                        .process
                        .push(WorkItem::new(identifier, Classification::Canon));
                }
            }
        }

        classified
    }
}
