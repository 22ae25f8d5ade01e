//! On-disk pipeline artifacts.
//!
//! The record sequence and the formatted export live as plain files in a
//! working directory; every enrichment pass loads the full collection,
//! transforms it, and writes it back whole.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::AuditRecord;

/// Fetched (and progressively enriched) audit records
const RECORDS_FILE: &str = "usage_logs.json";

/// Formatted bulk-import export
const EXPORT_FILE: &str = "usage_logs.csv";

pub struct ArtifactStore {
    work_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(work_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&work_dir)
            .with_context(|| format!("Failed to create working directory: {}", work_dir.display()))?;
        Ok(Self { work_dir })
    }

    pub fn records_path(&self) -> PathBuf {
        self.work_dir.join(RECORDS_FILE)
    }

    pub fn export_path(&self) -> PathBuf {
        self.work_dir.join(EXPORT_FILE)
    }

    pub fn load_records(&self) -> Result<Vec<AuditRecord>> {
        let path = self.records_path();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read records file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse records file: {}", path.display()))
    }

    pub fn save_records(&self, records: &[AuditRecord]) -> Result<()> {
        let path = self.records_path();
        let contents = serde_json::to_string_pretty(records)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write records file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf()).unwrap();

        let records: Vec<AuditRecord> = serde_json::from_value(serde_json::json!([
            {"eventType": "5", "eventDescription": "Report viewed", "ipAddress": "10.0.0.1"},
            {"eventType": 61, "login": "jane@example.com"}
        ]))
        .unwrap();

        store.save_records(&records).unwrap();
        let loaded = store.load_records().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].event_type.as_deref(), Some("5"));
        assert_eq!(loaded[0].extra["ipAddress"], "10.0.0.1");
        assert_eq!(loaded[1].event_type.as_deref(), Some("61"));
    }

    #[test]
    fn test_load_missing_records_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.load_records().is_err());
    }

    #[test]
    fn test_new_creates_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("artifacts").join("run1");
        let store = ArtifactStore::new(nested.clone()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.records_path(), nested.join("usage_logs.json"));
    }
}
