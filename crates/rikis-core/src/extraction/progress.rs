//! Persisted per-document progress.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::storage::write_bytes_atomic;

/// Progress of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentProgress {
    /// No further pages will be processed.
    pub done: bool,

    /// Highest page handled, successfully or not.
    #[serde(alias = "last_page")]
    pub last_page_processed: u32,

    pub total_pages: u32,

    /// Strategy that produced the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Only the preview page has been processed.
    pub preview: bool,

    /// Pages whose OCR failed and were skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<u32>,

    /// Last document-level error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Progress of every document, keyed by file name.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    documents: BTreeMap<String, DocumentProgress>,
}

impl ProgressStore {
    /// Load the store, starting empty when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let documents: BTreeMap<String, DocumentProgress> = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| ExtractionError::CorruptProgress {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };

        debug!("Loaded progress for {} documents from {}", documents.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            documents,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&DocumentProgress> {
        self.documents.get(name)
    }

    pub fn is_done(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.done)
    }

    pub fn documents(&self) -> &BTreeMap<String, DocumentProgress> {
        &self.documents
    }

    fn entry(&mut self, name: &str) -> &mut DocumentProgress {
        let progress = self.documents.entry(name.to_string()).or_default();
        progress.updated_at = Some(Utc::now());
        progress
    }

    /// Record a handled page. Failed pages are remembered and skipped.
    pub fn record_page(&mut self, name: &str, strategy: &str, page: u32, total_pages: u32, failed: bool) {
        let progress = self.entry(name);
        progress.total_pages = total_pages;
        progress.last_page_processed = progress.last_page_processed.max(page).min(total_pages);
        progress.strategy = Some(strategy.to_string());
        progress.last_error = None;
        if failed && !progress.failed_pages.contains(&page) {
            progress.failed_pages.push(page);
        }
    }

    /// Mark a document finished.
    pub fn mark_done(&mut self, name: &str, strategy: &str, total_pages: u32) {
        let progress = self.entry(name);
        progress.done = true;
        progress.preview = false;
        progress.total_pages = total_pages;
        progress.last_page_processed = total_pages;
        progress.strategy = Some(strategy.to_string());
        progress.last_error = None;
    }

    /// Note that only the preview page was processed.
    pub fn mark_preview(&mut self, name: &str) {
        self.entry(name).preview = true;
    }

    /// Record a document-level failure. The document stays pending.
    pub fn record_error(&mut self, name: &str, error: &str) {
        self.entry(name).last_error = Some(error.to_string());
    }

    /// Persist atomically.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_vec_pretty(&self.documents)?;
        write_bytes_atomic(&self.path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::load(&dir.path().join("progress.json")).unwrap();
        assert!(store.documents().is_empty());
        assert!(!store.is_done("a.pdf"));
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut store = ProgressStore::load(&path).unwrap();

        store.record_page("a.pdf", "ocr", 1, 3, false);
        store.record_page("a.pdf", "ocr", 2, 3, true);
        store.save().unwrap();

        let reloaded = ProgressStore::load(&path).unwrap();
        let progress = reloaded.get("a.pdf").unwrap();
        assert_eq!(progress.last_page_processed, 2);
        assert_eq!(progress.total_pages, 3);
        assert_eq!(progress.failed_pages, vec![2]);
        assert!(!progress.done);
        assert_eq!(progress.strategy.as_deref(), Some("ocr"));
    }

    #[test]
    fn test_last_page_never_exceeds_total() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProgressStore::load(&dir.path().join("p.json")).unwrap();
        store.record_page("a.pdf", "ocr", 9, 4, false);
        assert_eq!(store.get("a.pdf").unwrap().last_page_processed, 4);
    }

    #[test]
    fn test_reads_legacy_last_page_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, r#"{"a.pdf": {"done": true, "last_page": 12}}"#).unwrap();

        let store = ProgressStore::load(&path).unwrap();
        assert!(store.is_done("a.pdf"));
        assert_eq!(store.get("a.pdf").unwrap().last_page_processed, 12);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            ProgressStore::load(&path),
            Err(crate::error::RikisError::Extraction(ExtractionError::CorruptProgress { .. }))
        ));
    }
}
