//! Record Views
//!
//! Read-only projections of the store handed to display collaborators: the full
//! listing ordered by id and a filtered listing driven by a prefix query.

use crate::store::RecordStore;
use crate::types::Record;
use serde::{Deserialize, Serialize};

/// Prefix filter over id digits or name (case-insensitive)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    query: String,
}

impl RecordFilter {
    pub fn new(query: impl AsRef<str>) -> Self {
        Self {
            query: query.as_ref().trim().to_string(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.query.is_empty() {
            return true;
        }
        if record.id.to_string().starts_with(&self.query) {
            return true;
        }
        record
            .name
            .to_lowercase()
            .starts_with(&self.query.to_lowercase())
    }
}

/// Snapshot of the store as seen by a display collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordView {
    pub total: usize,
    pub filter: String,
    pub records: Vec<Record>,
}

impl RecordView {
    /// Project the store through a filter.
    pub fn project(store: &RecordStore, filter: &RecordFilter) -> Self {
        let records = store.records().filter(|r| filter.matches(r)).collect();
        Self {
            total: store.len(),
            filter: filter.query().to_string(),
            records,
        }
    }
}
