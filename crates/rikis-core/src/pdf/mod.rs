//! PDF processing module.

mod extractor;
pub mod tables;

pub use extractor::PdfExtractor;
pub use tables::{detect_tables, filter_ministry_rows, split_cells, MinistryRows};

use std::path::Path;

use image::DynamicImage;

use crate::error::PdfError;
use crate::extraction::DocumentSource;
use crate::models::LedgerTable;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text layer of the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract embedded images from a page.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// The scanned image of a page (1-indexed).
    fn render_page(&self, page: u32) -> Result<DynamicImage>;
}

/// [`DocumentSource`] over lopdf page counts and pdf-extract text tables.
#[derive(Debug, Clone)]
pub struct PdfDocumentSource {
    table_min_rows: usize,
}

impl PdfDocumentSource {
    pub fn new(table_min_rows: usize) -> Self {
        Self { table_min_rows }
    }
}

impl Default for PdfDocumentSource {
    fn default() -> Self {
        Self::new(2)
    }
}

impl DocumentSource for PdfDocumentSource {
    fn page_count(&self, path: &Path) -> crate::error::Result<u32> {
        Ok(PdfExtractor::open(path)?.page_count())
    }

    fn tables(&self, path: &Path) -> crate::error::Result<Vec<LedgerTable>> {
        let extractor = PdfExtractor::open(path)?;
        let text = match extractor.extract_text() {
            Ok(text) => text,
            // Image-only scans often have no usable text layer at all
            Err(e) => {
                tracing::debug!("No text layer in {}: {}", path.display(), e);
                return Ok(Vec::new());
            }
        };
        Ok(detect_tables(&text, self.table_min_rows)
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect())
    }
}
