//! Configuration for work item classification.

use serde::{Deserialize, Serialize};

use super::identifier::DEFAULT_MAX_RANGE_LEN;

/// Classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Filler identifiers, in the same syntax as command line input
    /// (`"7"`, `"10-12"`, `"20,21"`).
    #[serde(default)]
    pub filler: Vec<String>,

    /// Longest accepted range in identifier input.
    #[serde(default = "default_max_range_len")]
    pub max_range_len: u32,
}

fn default_max_range_len() -> u32 {
    DEFAULT_MAX_RANGE_LEN
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            filler: Vec::new(),
            max_range_len: default_max_range_len(),
        }
    }
}

impl ClassifierConfig {
    /// Set the filler list.
    pub fn with_filler<I, S>(mut self, filler: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filler = filler.into_iter().map(Into::into).collect();
        self
    }
}
