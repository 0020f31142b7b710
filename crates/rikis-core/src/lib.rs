//! Core library for Icelandic state-accounts ledger extraction.
//!
//! This crate provides:
//! - Resumable PDF extraction (structured tables first, OCR fallback)
//! - Line segmentation of OCR text into ministry/subcategory/amount records
//! - Fuzzy ministry matching against a canonical list
//! - A ministry-to-category mapping table with normalization and aggregation

pub mod error;
pub mod extraction;
pub mod ledger;
pub mod mapping;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod storage;

pub use error::{Result, RikisError};
pub use extraction::{Coordinator, DocumentStatus, ExtractionSummary, ProgressStore};
pub use ledger::{LedgerPipeline, MatchOutcome, MinistryAmount, MinistryMatcher, Segmenter};
pub use mapping::{MappingStore, Normalizer};
pub use models::{Category, LedgerTable, LineItem, NormalizedCategory, NormalizedRecord, RikisConfig};
pub use ocr::{OcrBackend, PageRenderer};
pub use pdf::{PdfExtractor, PdfProcessor};
