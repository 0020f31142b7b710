//! Resumable document extraction.
//!
//! Each input PDF is handed to an ordered list of strategies (structured
//! tables first, OCR second). Progress is persisted after every page so an
//! interrupted run resumes where it stopped, and finished documents are
//! never processed again.

pub mod coordinator;
pub mod progress;
pub mod strategy;

pub use coordinator::{Coordinator, DocumentStatus, ExtractionSummary};
pub use progress::{DocumentProgress, ProgressStore};
pub use strategy::{OcrStrategy, TableStrategy};

use std::path::{Path, PathBuf};

use crate::error::{ExtractionError, Result};
use crate::models::LedgerTable;

/// Access to page counts and structured tables of a document.
pub trait DocumentSource {
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Tables found in the document. Empty when there are none.
    fn tables(&self, path: &Path) -> Result<Vec<LedgerTable>>;
}

/// One input document and its extraction cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    /// File name, used as the progress key.
    pub name: String,
    pub path: PathBuf,
    /// 1-based batch number.
    pub batch: usize,
    /// Page count, 0 until known.
    pub total_pages: u32,
    /// Last page already processed (0 for a fresh document).
    pub last_page_processed: u32,
    pub done: bool,
}

impl DocumentJob {
    pub fn new(path: PathBuf, batch: usize) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            batch,
            total_pages: 0,
            last_page_processed: 0,
            done: false,
        }
    }

    /// File name without extension, used for output files.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// First page still to be processed.
    pub fn next_page(&self) -> u32 {
        self.last_page_processed + 1
    }
}

/// What a strategy produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// Output was written.
    Extracted(ExtractionReport),
    /// Nothing to extract with this strategy; try the next one.
    Empty,
    /// The strategy failed for the whole document.
    Failed(String),
}

/// Details of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub output: PathBuf,
    pub pages_processed: u32,
    pub pages_failed: u32,
    /// The document is finished (not a preview or partial run).
    pub complete: bool,
}

/// Shared state handed to strategies.
pub struct ExtractionContext<'a> {
    pub output_dir: &'a Path,
    pub source: &'a dyn DocumentSource,
    pub progress: &'a mut ProgressStore,
    pub preview: bool,
}

/// One way of turning a document into text or tables.
pub trait ExtractionStrategy {
    /// Name recorded in the progress file.
    fn name(&self) -> &'static str;

    fn extract(&self, job: &mut DocumentJob, ctx: &mut ExtractionContext<'_>) -> StrategyOutcome;
}

/// PDFs directly inside `dir`, sorted by file name.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ExtractionError::InputNotFound(dir.to_path_buf()).into());
    }

    let mut documents: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    documents.sort();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_documents_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let docs = discover_documents(dir.path()).unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = discover_documents(Path::new("/nonexistent/input")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RikisError::Extraction(ExtractionError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_job_names() {
        let job = DocumentJob::new(PathBuf::from("in/Rikisreikn2009.pdf"), 1);
        assert_eq!(job.name, "Rikisreikn2009.pdf");
        assert_eq!(job.stem(), "Rikisreikn2009");
        assert_eq!(job.next_page(), 1);
    }
}
