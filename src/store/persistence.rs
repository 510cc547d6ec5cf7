//! CSV-backed record persistence.
//!
//! One record per line as `id,name`. Lines without a comma or with a non-numeric id
//! are skipped on load; later lines win over earlier ones with the same id.

use super::RecordPersistence;
use crate::error::StorageError;
use crate::types::RecordId;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Line-oriented `id,name` file
#[derive(Debug, Clone)]
pub struct CsvRecordFile {
    path: PathBuf,
}

impl CsvRecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse CSV content into a mapping.
pub fn parse_records(content: &str) -> BTreeMap<RecordId, String> {
    let mut records = BTreeMap::new();
    for (index, line) in content.lines().enumerate() {
        let Some((id, name)) = line.split_once(',') else {
            if !line.trim().is_empty() {
                debug!(line = index + 1, "Skipping CSV line without a name column");
            }
            continue;
        };
        match id.trim().parse::<RecordId>() {
            Ok(id) => {
                records.insert(id, name.trim().to_string());
            }
            Err(_) => {
                debug!(line = index + 1, value = id, "Skipping CSV line with non-numeric id");
            }
        }
    }
    records
}

/// Render a mapping as CSV content.
pub fn render_records(records: &BTreeMap<RecordId, String>) -> String {
    let mut out = String::new();
    for (id, name) in records {
        if name.contains(',') || name.contains('\n') {
            warn!(id, "Record name contains a separator and will not load back verbatim");
        }
        out.push_str(&format!("{},{}\n", id, name));
    }
    out
}

impl RecordPersistence for CsvRecordFile {
    fn load(&self) -> Result<BTreeMap<RecordId, String>, StorageError> {
        let content = std::fs::read_to_string(&self.path)?;
        let records = parse_records(&content);
        debug!(path = %self.path.display(), count = records.len(), "Loaded records");
        Ok(records)
    }

    fn save(&self, records: &BTreeMap<RecordId, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write next to the target and rename so a crash never leaves a half file.
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(render_records(records).as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), count = records.len(), "Saved records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_malformed_lines() {
        let content = "770000001,Alice\nnot-a-number,Bob\n\nlonely\n770000002, Carol \n";
        let records = parse_records(content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[&770000001], "Alice");
        assert_eq!(records[&770000002], "Carol");
    }

    #[test]
    fn test_parse_later_line_wins() {
        let records = parse_records("1,first\n1,second\n");
        assert_eq!(records[&1], "second");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let file = CsvRecordFile::new(temp.path().join("missing.csv"));
        assert!(matches!(file.load(), Err(StorageError::IoError(_))));
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_tmp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("staff.csv");
        let file = CsvRecordFile::new(&path);
        let mut records = BTreeMap::new();
        records.insert(770000001, "Alice".to_string());
        file.save(&records).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "770000001,Alice\n");
        assert!(!path.with_extension("csv.tmp").exists());
    }

    proptest! {
        #[test]
        fn prop_save_then_load_round_trips(
            records in proptest::collection::btree_map(any::<i64>(), "[A-Za-z][A-Za-z .'-]{0,20}[A-Za-z]", 0..30)
        ) {
            let temp = TempDir::new().unwrap();
            let file = CsvRecordFile::new(temp.path().join("staff.csv"));
            file.save(&records).unwrap();
            let loaded = file.load().unwrap();
            prop_assert_eq!(loaded, records);
        }
    }
}
