//! Page renderers.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;
use tracing::trace;

use super::PageRenderer;
use crate::error::OcrError;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Rasterizes pages with poppler's `pdftoppm`.
#[derive(Debug, Clone, Default)]
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, pdf: &Path, page: u32, dpi: u32) -> Result<DynamicImage, OcrError> {
        let temp_dir = TempDir::new()?;
        let prefix = temp_dir.path().join("page");
        let page_str = page.to_string();
        let dpi_str = dpi.to_string();

        trace!("pdftoppm page {} of {} at {} DPI", page, pdf.display(), dpi);
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
            .arg(pdf)
            .arg(&prefix)
            .status();

        match status {
            Ok(s) if s.success() => {
                let path = find_page_image(temp_dir.path(), page).ok_or_else(|| {
                    OcrError::Render(format!("no image generated for page {}", page))
                })?;
                image::open(&path).map_err(|e| OcrError::Render(e.to_string()))
            }
            Ok(s) => Err(OcrError::Render(format!(
                "pdftoppm exited with {} on page {}",
                s, page
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("pdftoppm not found (install poppler-utils)".to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

/// Find the image pdftoppm wrote for a page.
///
/// Files are named `page-1.png`, `page-01.png`, ... with padding that
/// depends on the document's page count.
pub fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    (1..=4)
        .map(|width| dir.join(format!("page-{:0width$}.png", page, width = width)))
        .find(|path| path.exists())
}

/// Uses the scanned image embedded in each page. DPI is ignored; the image
/// is returned at its native resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageRenderer;

impl PageRenderer for EmbeddedImageRenderer {
    fn render(&self, pdf: &Path, page: u32, _dpi: u32) -> Result<DynamicImage, OcrError> {
        let extractor = PdfExtractor::open(pdf).map_err(|e| OcrError::Render(e.to_string()))?;
        extractor
            .render_page(page)
            .map_err(|e| OcrError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_image_padding() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), 7).is_none());

        let path = temp.path().join("page-007.png");
        std::fs::write(&path, b"png").unwrap();
        assert_eq!(find_page_image(temp.path(), 7), Some(path));
    }

    #[test]
    fn test_embedded_renderer_missing_file() {
        let err = EmbeddedImageRenderer
            .render(Path::new("/nonexistent/report.pdf"), 1, 150)
            .unwrap_err();
        assert!(matches!(err, OcrError::Render(_)));
    }
}
