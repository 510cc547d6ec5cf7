//! Selected-record snapshot file.
//!
//! The Directory mirrors its current selection into a small JSON document so an
//! Editor started later can show the selection before any notification arrives.

use crate::error::StorageError;
use crate::types::{Record, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default snapshot file name
pub const SELECTION_FILE_NAME: &str = "SelectedStaff.json";

/// `ID` as written by us (a number) or by older tools (a decimal string)
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum IdField {
    Number(RecordId),
    Text(String),
}

impl IdField {
    fn id(&self) -> Result<RecordId, StorageError> {
        match self {
            IdField::Number(id) => Ok(*id),
            IdField::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| StorageError::Serialization(format!("Invalid selection ID '{}'", text))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SelectionDocument {
    #[serde(rename = "ID")]
    id: IdField,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "UpdatedAt", default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON snapshot of the selected record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFile {
    path: PathBuf,
}

impl SelectionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<Documents>/SelectedStaff.json`, or the data dir when there is no
    /// documents folder.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(docs) = directories::UserDirs::new()
            .as_ref()
            .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
        {
            return Some(docs.join(SELECTION_FILE_NAME));
        }
        directories::ProjectDirs::from("", "rostersync", "rostersync")
            .map(|dirs| dirs.data_dir().join(SELECTION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the selection, or remove the file when there is none.
    pub fn save(&self, selection: Option<&Record>) -> Result<(), StorageError> {
        let Some(record) = selection else {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    debug!(path = %self.path.display(), "Selection file removed");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        };

        let document = SelectionDocument {
            id: IdField::Number(record.id),
            name: record.name.clone(),
            updated_at: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), id = record.id, "Selection file written");
        Ok(())
    }

    /// Read the stored selection. A missing file means no selection.
    pub fn load(&self) -> Result<Option<Record>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document: SelectionDocument = serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(Record::new(document.id.id()?, document.name)))
    }
}
