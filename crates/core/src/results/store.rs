//! Append-only store of terminal records.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::work::{AggregateRecord, Identifier};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record for identifier {0} already stored")]
    Duplicate(Identifier),
}

/// Identifier to record, iterated in ascending order.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: BTreeMap<Identifier, AggregateRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record. A second record for the same identifier is rejected.
    pub fn insert(&mut self, record: AggregateRecord) -> Result<(), StoreError> {
        let identifier = record.identifier;
        if self.records.contains_key(&identifier) {
            return Err(StoreError::Duplicate(identifier));
        }
        self.records.insert(identifier, record);
        Ok(())
    }

    /// Flags a stored record as interrupted. Returns false if absent.
    pub fn mark_interrupted(&mut self, identifier: Identifier) -> bool {
        match self.records.get_mut(&identifier) {
            Some(record) => {
                record.interrupted = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, identifier: Identifier) -> Option<&AggregateRecord> {
        self.records.get(&identifier)
    }

    pub fn contains(&self, identifier: Identifier) -> bool {
        self.records.contains_key(&identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AggregateRecord> {
        self.records.values()
    }

    pub fn as_map(&self) -> &BTreeMap<Identifier, AggregateRecord> {
        &self.records
    }

    pub fn into_map(self) -> BTreeMap<Identifier, AggregateRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut store = ResultStore::new();
        store.insert(AggregateRecord::filler(3)).unwrap();
        assert_eq!(
            store.insert(AggregateRecord::filler(3)),
            Err(StoreError::Duplicate(3))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_records_ascending() {
        let mut store = ResultStore::new();
        for id in [10, 2, 7] {
            store.insert(AggregateRecord::filler(id)).unwrap();
        }
        let ids: Vec<_> = store.records().map(|r| r.identifier).collect();
        assert_eq!(ids, vec![2, 7, 10]);
    }

    #[test]
    fn test_mark_interrupted() {
        let mut store = ResultStore::new();
        store.insert(AggregateRecord::filler(1)).unwrap();
        assert!(store.mark_interrupted(1));
        assert!(store.get(1).unwrap().interrupted);
        assert!(!store.mark_interrupted(2));
    }
}
