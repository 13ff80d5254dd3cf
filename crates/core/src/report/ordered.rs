//! Strict ascending emission of out-of-order completions.

use std::collections::HashMap;

use thiserror::Error;

use crate::work::{AggregateRecord, Identifier};

/// Errors returned by [`OrderedReporter::complete`]. The reporter state is
/// unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Identifier {0} is not part of this run")]
    UnknownIdentifier(Identifier),

    #[error("Identifier {0} was already completed")]
    AlreadyReported(Identifier),

    #[error("Reporter already flushed")]
    Closed,
}

/// Buffers completed records and releases them in sequence order.
///
/// A record for identifier N is released only after every identifier
/// before N in the sequence has been released.
#[derive(Debug)]
pub struct OrderedReporter {
    /// Sorted, duplicate-free.
    sequence: Vec<Identifier>,
    /// Index of the next identifier to release.
    cursor: usize,
    buffer: HashMap<Identifier, AggregateRecord>,
    reported_up_to: Option<Identifier>,
    closed: bool,
}

impl OrderedReporter {
    pub fn new(identifiers: impl IntoIterator<Item = Identifier>) -> Self {
        let mut sequence: Vec<Identifier> = identifiers.into_iter().collect();
        sequence.sort_unstable();
        sequence.dedup();
        Self {
            sequence,
            cursor: 0,
            buffer: HashMap::new(),
            reported_up_to: None,
            closed: false,
        }
    }

    pub fn sequence(&self) -> &[Identifier] {
        &self.sequence
    }

    /// Highest identifier released so far.
    pub fn reported_up_to(&self) -> Option<Identifier> {
        self.reported_up_to
    }

    /// Number of records waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether every identifier in the sequence has been released.
    pub fn is_finished(&self) -> bool {
        self.cursor == self.sequence.len()
    }

    fn was_released(&self, identifier: Identifier) -> bool {
        self.sequence[..self.cursor].binary_search(&identifier).is_ok()
    }

    /// Accepts a completed record and returns the records now releasable,
    /// in ascending order (possibly none).
    pub fn complete(&mut self, record: AggregateRecord) -> Result<Vec<AggregateRecord>, ReportError> {
        let identifier = record.identifier;
        if self.closed {
            return Err(ReportError::Closed);
        }
        if self.sequence.binary_search(&identifier).is_err() {
            return Err(ReportError::UnknownIdentifier(identifier));
        }
        if self.buffer.contains_key(&identifier) || self.was_released(identifier) {
            return Err(ReportError::AlreadyReported(identifier));
        }

        self.buffer.insert(identifier, record);

        let mut released = Vec::new();
        while let Some(&next) = self.sequence.get(self.cursor) {
            let Some(record) = self.buffer.remove(&next) else {
                break;
            };
            released.push(record);
            self.reported_up_to = Some(next);
            self.cursor += 1;
        }
        Ok(released)
    }

    /// Drains every buffered record in ascending order regardless of gaps,
    /// and closes the reporter.
    pub fn flush_remaining(&mut self) -> Vec<AggregateRecord> {
        self.closed = true;
        let mut remaining: Vec<AggregateRecord> = self.buffer.drain().map(|(_, r)| r).collect();
        remaining.sort_by_key(|r| r.identifier);
        if let Some(last) = remaining.last() {
            self.reported_up_to = self.reported_up_to.max(Some(last.identifier));
        }
        remaining
    }

    /// Identifiers neither released nor buffered.
    pub fn outstanding(&self) -> Vec<Identifier> {
        self.sequence[self.cursor..]
            .iter()
            .copied()
            .filter(|id| !self.buffer.contains_key(id))
            .collect()
    }
}
