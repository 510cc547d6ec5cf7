//! Core types for the staff directory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RecordId: integer key of a staff record
pub type RecordId = i64;

/// Record: one `(id, name)` entry, passed around by value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}
