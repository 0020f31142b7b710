//! Tesseract OCR backend.
//!
//! Runs the `tesseract` binary on a temporary PNG and reads stdout.

use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;
use tracing::trace;

use super::OcrBackend;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Tesseract command-line backend.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    engine_mode: u8,
    page_segmentation_mode: u8,
}

impl TesseractBackend {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            engine_mode: config.engine_mode,
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    /// Arguments after the image path.
    fn args(&self, language: &str) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            language.to_string(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("page.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::Recognition(format!("failed to write page image: {}", e)))?;

        trace!("tesseract {} {:?}", image_path.display(), self.args(language));
        let output = Command::new("tesseract")
            .arg(&image_path)
            .args(self.args(language))
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Recognition(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}
