//! Record Store
//!
//! The Directory's authoritative `id -> name` mapping. One instance is owned by the
//! Directory runtime and lent to the dispatcher; there is no process-wide state.

pub mod persistence;

use crate::error::{DomainError, StorageError};
use crate::types::{Record, RecordId};
use std::collections::BTreeMap;

/// In-memory mapping of record id to name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<RecordId, String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: RecordId) -> Option<&str> {
        self.records.get(&id).map(String::as_str)
    }

    /// Get a record by id as an owned value
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.get(id).map(|name| Record::new(id, name))
    }

    /// Insert a new record; an existing id is never overwritten.
    pub fn insert(&mut self, record: Record) -> Result<(), DomainError> {
        if self.records.contains_key(&record.id) {
            return Err(DomainError::DuplicateId(record.id));
        }
        self.records.insert(record.id, record.name);
        Ok(())
    }

    /// Replace the name of an existing record, returning the previous name.
    pub fn update(&mut self, id: RecordId, name: String) -> Result<String, DomainError> {
        match self.records.get_mut(&id) {
            Some(current) => Ok(std::mem::replace(current, name)),
            None => Err(DomainError::MissingId(id)),
        }
    }

    /// Remove an existing record.
    pub fn remove(&mut self, id: RecordId) -> Result<Record, DomainError> {
        self.records
            .remove(&id)
            .map(|name| Record::new(id, name))
            .ok_or(DomainError::MissingId(id))
    }

    /// Records ordered by id
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.records
            .iter()
            .map(|(id, name)| Record::new(*id, name.clone()))
    }

    /// Count of ids inside `[start, end)`
    pub fn count_in_range(&self, start: RecordId, end: RecordId) -> usize {
        if start >= end {
            return 0;
        }
        self.records.range(start..end).count()
    }

    /// Borrow the underlying mapping (used by persistence)
    pub fn as_map(&self) -> &BTreeMap<RecordId, String> {
        &self.records
    }
}

impl From<BTreeMap<RecordId, String>> for RecordStore {
    fn from(records: BTreeMap<RecordId, String>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for RecordStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|r| (r.id, r.name)).collect(),
        }
    }
}

/// Persistence collaborator: loads the store at start-up and writes it on `S`.
pub trait RecordPersistence: Send + Sync {
    fn load(&self) -> Result<BTreeMap<RecordId, String>, StorageError>;
    fn save(&self, records: &BTreeMap<RecordId, String>) -> Result<(), StorageError>;
}
