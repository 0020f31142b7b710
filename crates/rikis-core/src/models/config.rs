//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the rikis pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RikisConfig {
    /// PDF table extraction configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Batch coordination configuration.
    pub extraction: ExtractionConfig,

    /// Line segmentation configuration.
    pub segmentation: SegmentationConfig,

    /// Ministry fuzzy matching configuration.
    pub matching: MatchingConfig,

    /// Mapping and normalization configuration.
    pub mapping: MappingConfig,

    /// External category classifier configuration.
    pub classifier: ClassifierConfig,
}

/// Structured table extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum consecutive multi-cell lines to count as a table.
    pub table_min_rows: usize,

    /// Header fragments that identify the ministry-bearing column.
    pub ministry_column_fragments: Vec<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            table_min_rows: 2,
            ministry_column_fragments: vec!["minist".to_string(), "ráðuneyti".to_string()],
        }
    }
}

/// Which OCR engine to run pages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Tesseract command-line binary.
    Tesseract,
    /// Pure Rust ONNX engine (requires the `onnx` feature).
    Onnx,
}

/// How pages are turned into images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Rasterize with poppler's `pdftoppm`.
    Pdftoppm,
    /// Use the scanned image embedded in each page.
    Embedded,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// OCR engine.
    pub backend: OcrBackendKind,

    /// Page renderer.
    pub renderer: RendererKind,

    /// DPI for the first render attempt.
    pub default_dpi: u32,

    /// DPI used when the first render is too large.
    pub fallback_dpi: u32,

    /// Raw image size ceiling in bytes before re-rendering.
    pub max_image_bytes: usize,

    /// Language tried first.
    pub primary_language: String,

    /// Language tried when the primary pass returns only whitespace.
    pub secondary_language: String,

    /// Tesseract OCR engine mode (`--oem`).
    pub engine_mode: u8,

    /// Tesseract page segmentation mode (`--psm`).
    pub page_segmentation_mode: u8,

    /// Directory with ONNX model files (onnx backend only).
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens from the ONNX recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            renderer: RendererKind::Pdftoppm,
            default_dpi: 150,
            fallback_dpi: 100,
            max_image_bytes: 20 * 1024 * 1024,
            primary_language: "isl".to_string(),
            secondary_language: "eng".to_string(),
            engine_mode: 1,
            page_segmentation_mode: 4,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// Batch coordination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Documents per batch (memory bound only).
    pub batch_size: usize,

    /// Progress file name inside the output directory.
    pub progress_file: String,

    /// Process only the first page of each document.
    pub preview: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            progress_file: "progress.json".to_string(),
            preview: false,
        }
    }
}

/// Line segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Keywords marking a ministry heading line.
    pub ministry_keywords: Vec<String>,

    /// Lines with fewer tokens than this may become subcategories.
    pub subcategory_max_tokens: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            ministry_keywords: vec!["ráðuneyti".to_string()],
            subcategory_max_tokens: 6,
        }
    }
}

/// Ministry fuzzy matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity (0-100) to accept a match.
    pub threshold: f64,

    /// Lines after a matched line searched for an amount.
    pub lookahead_lines: usize,

    /// Section label attached to scan results.
    pub section_label: String,

    /// Canonicalize ministry names through the matcher before mapping lookup.
    pub canonicalize_before_mapping: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 80.0,
            lookahead_lines: 2,
            section_label: "A-hluti".to_string(),
            canonicalize_before_mapping: true,
        }
    }
}

/// Mapping and normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Column names (case-insensitive) that may hold the ministry.
    pub ministry_columns: Vec<String>,

    /// Append newly seen unmapped names to the mapping file.
    pub append_unmapped: bool,

    /// File name of the unmapped list written next to the mapping file.
    pub unmapped_file: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            ministry_columns: vec![
                "category".to_string(),
                "ráðuneyti".to_string(),
                "ministry".to_string(),
            ],
            append_unmapped: true,
            unmapped_file: "unmapped_categories.csv".to_string(),
        }
    }
}

/// External category classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Program to run.
    pub command: String,

    /// Arguments passed to the program; the prompt goes to stdin.
    pub args: Vec<String>,

    /// Seconds before a single classification is abandoned.
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: "ollama".to_string(),
            args: vec!["run".to_string(), "phi3:3.8b".to_string()],
            timeout_secs: 60,
        }
    }
}

impl RikisConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: RikisConfig =
            serde_json::from_str(r#"{"matching": {"threshold": 85.0}}"#).unwrap();

        assert_eq!(config.matching.threshold, 85.0);
        assert_eq!(config.matching.lookahead_lines, 2);
        assert_eq!(config.ocr.default_dpi, 150);
        assert_eq!(config.ocr.backend, OcrBackendKind::Tesseract);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RikisConfig::default();
        config.extraction.batch_size = 3;
        config.save(&path).unwrap();

        let loaded = RikisConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.batch_size, 3);
        assert_eq!(loaded.ocr.primary_language, "isl");
    }
}
