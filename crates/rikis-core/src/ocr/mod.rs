//! Page rendering and OCR backends.
//!
//! Scanned reports go through two external tools: a renderer that turns a
//! PDF page into an image and an OCR engine that reads it. Both are traits
//! so the coordinator can be driven by stubs in tests.

mod render;
mod tesseract;

#[cfg(feature = "onnx")]
mod pure_engine;

pub use render::{find_page_image, EmbeddedImageRenderer, PdftoppmRenderer};
pub use tesseract::TesseractBackend;

#[cfg(feature = "onnx")]
pub use pure_engine::PureOcrEngine;

use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig, RendererKind};

/// Turns a PDF page into an image.
pub trait PageRenderer {
    /// Render `page` (1-indexed) of `pdf` at `dpi`.
    fn render(&self, pdf: &Path, page: u32, dpi: u32) -> Result<DynamicImage, OcrError>;
}

/// Reads text from a page image.
pub trait OcrBackend {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Recognize text using the given language code (e.g. `isl`).
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Render a page, re-rendering at the fallback DPI when the raw image is
/// larger than `max_image_bytes`.
pub fn render_adaptive(
    renderer: &dyn PageRenderer,
    pdf: &Path,
    page: u32,
    config: &OcrConfig,
) -> Result<DynamicImage, OcrError> {
    let image = renderer.render(pdf, page, config.default_dpi)?;
    let size = image.as_bytes().len();
    if size <= config.max_image_bytes {
        return Ok(image);
    }

    debug!(
        "Page {} is {} bytes at {} DPI, re-rendering at {} DPI",
        page, size, config.default_dpi, config.fallback_dpi
    );
    drop(image);
    renderer.render(pdf, page, config.fallback_dpi)
}

/// OCR with the primary language, retrying with the secondary language when
/// the first pass returns only whitespace.
pub fn recognize_with_fallback(
    backend: &dyn OcrBackend,
    image: &DynamicImage,
    config: &OcrConfig,
) -> Result<String, OcrError> {
    let text = backend.recognize(image, &config.primary_language)?;
    if !text.trim().is_empty() {
        return Ok(text);
    }

    debug!(
        "{} returned no text for {}, retrying with {}",
        backend.name(),
        config.primary_language,
        config.secondary_language
    );
    backend.recognize(image, &config.secondary_language)
}

/// Build the configured OCR backend.
pub fn create_backend(config: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    match config.backend {
        OcrBackendKind::Tesseract => Ok(Box::new(TesseractBackend::new(config))),
        #[cfg(feature = "onnx")]
        OcrBackendKind::Onnx => Ok(Box::new(PureOcrEngine::from_dir(
            &config.model_dir,
            config.clone(),
        )?)),
        #[cfg(not(feature = "onnx"))]
        OcrBackendKind::Onnx => Err(OcrError::BackendNotAvailable(
            "onnx backend requires building with the `onnx` feature".to_string(),
        )),
    }
}

/// Build the configured page renderer.
pub fn create_renderer(config: &OcrConfig) -> Box<dyn PageRenderer> {
    match config.renderer {
        RendererKind::Pdftoppm => Box::new(PdftoppmRenderer::new()),
        RendererKind::Embedded => Box::new(EmbeddedImageRenderer),
    }
}
