//! Error types for the rikis-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the rikis library.
#[derive(Error, Debug)]
pub enum RikisError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Extraction coordination error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Mapping table error.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to page rendering and OCR.
#[derive(Error, Debug)]
pub enum OcrError {
    /// A required external program is not installed.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),

    /// Rendering a page to an image failed.
    #[error("page rendering failed: {0}")]
    Render(String),

    /// The OCR engine reported a failure.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// I/O error while exchanging files with an external program.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while coordinating a batch.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Input directory does not exist.
    #[error("input directory not found: {0}")]
    InputNotFound(PathBuf),

    /// Every strategy failed for a document.
    #[error("all strategies failed for {document}: {reason}")]
    AllStrategiesFailed { document: String, reason: String },

    /// Progress file could not be read.
    #[error("corrupt progress file {path}: {reason}")]
    CorruptProgress { path: PathBuf, reason: String },
}

/// Errors related to the ministry mapping table.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Mapping file missing.
    #[error("mapping file not found: {0}")]
    NotFound(PathBuf),

    /// Mapping file has fewer columns than required.
    #[error("mapping file {path} must have at least 3 columns (code, ministry, category), found {found}")]
    Schema { path: PathBuf, found: usize },

    /// External classifier failed.
    #[error("classifier failed: {0}")]
    Classifier(String),
}

/// Result type for the rikis library.
pub type Result<T> = std::result::Result<T, RikisError>;
