//! Batch coordination over a directory of PDFs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{
    discover_documents, DocumentJob, DocumentSource, ExtractionContext, ExtractionReport,
    ExtractionStrategy, OcrStrategy, ProgressStore, StrategyOutcome, TableStrategy,
};
use crate::error::{ExtractionError, Result};
use crate::models::config::{ExtractionConfig, OcrBackendKind, RendererKind};
use crate::models::RikisConfig;
use crate::ocr::{check_binary, create_backend, create_renderer};
use crate::pdf::PdfDocumentSource;

/// What happened to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    /// About to be processed.
    Started,
    /// Already finished in an earlier run.
    Skipped,
    /// A strategy produced output.
    Extracted {
        strategy: &'static str,
        report: ExtractionReport,
    },
    /// No strategy produced output.
    Failed(String),
}

/// Counts for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Documents handed to the strategies.
    pub processed: usize,
    pub table: usize,
    pub ocr: usize,
    pub failed: usize,
    /// Documents finished in an earlier run.
    pub skipped: usize,
    pub pages_ocred: u32,
    pub pages_failed: u32,
}

/// Runs documents through the strategies in order, persisting progress.
pub struct Coordinator {
    source: Box<dyn DocumentSource>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    config: ExtractionConfig,
}

impl Coordinator {
    pub fn new(
        source: Box<dyn DocumentSource>,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            source,
            strategies,
            config,
        }
    }

    /// Table extraction first, OCR second, with the configured tools.
    pub fn from_config(config: &RikisConfig) -> Result<Self> {
        let backend = create_backend(&config.ocr)?;
        let renderer = create_renderer(&config.ocr);
        debug!("OCR backend: {}", backend.name());

        let mut tools = Vec::new();
        if config.ocr.backend == OcrBackendKind::Tesseract {
            tools.push("tesseract");
        }
        if config.ocr.renderer == RendererKind::Pdftoppm {
            tools.push("pdftoppm");
        }
        for tool in tools.into_iter().filter(|t| !check_binary(t)) {
            warn!("{} not found in PATH, scanned documents will fail until it is installed", tool);
        }

        Ok(Self::new(
            Box::new(PdfDocumentSource::new(config.pdf.table_min_rows)),
            vec![
                Box::new(TableStrategy::new(config.pdf.clone())) as Box<dyn ExtractionStrategy>,
                Box::new(OcrStrategy::new(renderer, backend, config.ocr.clone())),
            ],
            config.extraction.clone(),
        ))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Path of the progress file for an output directory.
    pub fn progress_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.config.progress_file)
    }

    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<ExtractionSummary> {
        self.run_observed(input_dir, output_dir, |_, _| {})
    }

    /// Process every pending PDF in `input_dir`, reporting each status change.
    pub fn run_observed<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        mut observe: F,
    ) -> Result<ExtractionSummary>
    where
        F: FnMut(&DocumentJob, &DocumentStatus),
    {
        let start = Instant::now();
        let documents = discover_documents(input_dir)?;
        std::fs::create_dir_all(output_dir)?;
        let mut progress = ProgressStore::load(&self.progress_path(output_dir))?;
        let mut summary = ExtractionSummary::default();

        let mut pending = Vec::new();
        for path in documents {
            let job = DocumentJob::new(path, 0);
            if progress.is_done(&job.name) {
                debug!("Skipping {} (done)", job.name);
                summary.skipped += 1;
                observe(&job, &DocumentStatus::Skipped);
            } else {
                pending.push(job.path);
            }
        }

        if pending.is_empty() {
            info!("All {} documents already processed", summary.skipped);
            return Ok(summary);
        }

        let batch_size = self.config.batch_size.max(1);
        let batches = pending.len().div_ceil(batch_size);
        info!(
            "Processing {} documents in {} batches ({} already done)",
            pending.len(),
            batches,
            summary.skipped
        );

        for (index, batch) in pending.chunks(batch_size).enumerate() {
            debug!("Batch {}/{}", index + 1, batches);
            for path in batch {
                let mut job = DocumentJob::new(path.clone(), index + 1);
                if let Some(saved) = progress.get(&job.name) {
                    job.total_pages = saved.total_pages;
                    job.last_page_processed = saved.last_page_processed;
                }

                observe(&job, &DocumentStatus::Started);
                let status = self.process_document(&mut job, output_dir, &mut progress);

                summary.processed += 1;
                match &status {
                    DocumentStatus::Extracted { strategy, report } => {
                        if *strategy == "table" {
                            summary.table += 1;
                        } else {
                            summary.ocr += 1;
                        }
                        summary.pages_ocred += report.pages_processed;
                        summary.pages_failed += report.pages_failed;
                    }
                    DocumentStatus::Failed(_) => summary.failed += 1,
                    DocumentStatus::Started | DocumentStatus::Skipped => {}
                }
                observe(&job, &status);
            }
        }

        info!(
            "Extraction finished in {:.1}s: {} table, {} OCR, {} failed, {} skipped",
            start.elapsed().as_secs_f64(),
            summary.table,
            summary.ocr,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    fn process_document(
        &self,
        job: &mut DocumentJob,
        output_dir: &Path,
        progress: &mut ProgressStore,
    ) -> DocumentStatus {
        let mut reasons = Vec::new();

        for strategy in &self.strategies {
            let mut ctx = ExtractionContext {
                output_dir,
                source: self.source.as_ref(),
                progress: &mut *progress,
                preview: self.config.preview,
            };
            match strategy.extract(job, &mut ctx) {
                StrategyOutcome::Extracted(report) => {
                    return DocumentStatus::Extracted {
                        strategy: strategy.name(),
                        report,
                    };
                }
                StrategyOutcome::Empty => debug!("{}: {} found nothing", job.name, strategy.name()),
                StrategyOutcome::Failed(reason) => {
                    warn!("{}: {} failed: {}", job.name, strategy.name(), reason);
                    reasons.push(format!("{}: {}", strategy.name(), reason));
                }
            }
        }

        let reason = if reasons.is_empty() {
            "no strategy produced output".to_string()
        } else {
            reasons.join("; ")
        };
        let error = ExtractionError::AllStrategiesFailed {
            document: job.name.clone(),
            reason,
        };
        progress.record_error(&job.name, &error.to_string());
        if let Err(e) = progress.save() {
            warn!("Could not save progress: {}", e);
        }
        DocumentStatus::Failed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::config::{OcrConfig, PdfConfig};
    use crate::models::LedgerTable;
    use crate::ocr::{OcrBackend, PageRenderer};
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    struct StubSource {
        pages: u32,
        tables: Vec<LedgerTable>,
    }

    impl DocumentSource for StubSource {
        fn page_count(&self, _path: &Path) -> Result<u32> {
            Ok(self.pages)
        }

        fn tables(&self, _path: &Path) -> Result<Vec<LedgerTable>> {
            Ok(self.tables.clone())
        }
    }

    /// Fails to render the pages listed in `broken`.
    struct StubRenderer {
        broken: Vec<u32>,
    }

    impl PageRenderer for StubRenderer {
        fn render(&self, _pdf: &Path, page: u32, _dpi: u32) -> std::result::Result<DynamicImage, OcrError> {
            if self.broken.contains(&page) {
                return Err(OcrError::Render(format!("page {} is damaged", page)));
            }
            Ok(DynamicImage::new_luma8(4, 4))
        }
    }

    struct StubBackend {
        calls: Rc<Cell<usize>>,
        available: bool,
    }

    impl OcrBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn recognize(&self, _image: &DynamicImage, _language: &str) -> std::result::Result<String, OcrError> {
            if !self.available {
                return Err(OcrError::BackendNotAvailable("tesseract not found".to_string()));
            }
            self.calls.set(self.calls.get() + 1);
            Ok(format!("Forsætisráðuneyti {}", self.calls.get()))
        }
    }

    struct Fixture {
        input: tempfile::TempDir,
        output: tempfile::TempDir,
        calls: Rc<Cell<usize>>,
    }

    impl Fixture {
        fn new(documents: &[&str]) -> Self {
            let input = tempfile::tempdir().unwrap();
            for name in documents {
                std::fs::write(input.path().join(name), b"%PDF-1.4").unwrap();
            }
            Self {
                input,
                output: tempfile::tempdir().unwrap(),
                calls: Rc::new(Cell::new(0)),
            }
        }

        fn coordinator(&self, source: StubSource, broken: Vec<u32>, available: bool, preview: bool) -> Coordinator {
            let backend = StubBackend {
                calls: Rc::clone(&self.calls),
                available,
            };
            Coordinator::new(
                Box::new(source),
                vec![
                    Box::new(TableStrategy::new(PdfConfig::default())) as Box<dyn ExtractionStrategy>,
                    Box::new(OcrStrategy::new(
                        Box::new(StubRenderer { broken }),
                        Box::new(backend),
                        OcrConfig::default(),
                    )),
                ],
                ExtractionConfig {
                    preview,
                    ..ExtractionConfig::default()
                },
            )
        }

        fn run(&self, coordinator: &Coordinator) -> ExtractionSummary {
            coordinator.run(self.input.path(), self.output.path()).unwrap()
        }

        fn progress(&self) -> ProgressStore {
            ProgressStore::load(&self.output.path().join("progress.json")).unwrap()
        }

        fn text(&self, stem: &str) -> String {
            std::fs::read_to_string(self.output.path().join(format!("{}.txt", stem))).unwrap()
        }
    }

    fn scanned(pages: u32) -> StubSource {
        StubSource {
            pages,
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_tables_win_over_ocr() {
        let fx = Fixture::new(&["2009.pdf"]);
        let mut table = LedgerTable::new(vec!["Ráðuneyti".to_string(), "Gjöld".to_string()]);
        table.rows.push(vec!["Forsætisráðuneyti".to_string(), "1.250".to_string()]);
        table.rows.push(vec!["Samtals".to_string(), "9.999".to_string()]);
        let source = StubSource {
            pages: 5,
            tables: vec![table],
        };

        let summary = fx.run(&fx.coordinator(source, vec![], true, false));

        assert_eq!(summary.table, 1);
        assert_eq!(summary.ocr, 0);
        assert_eq!(fx.calls.get(), 0);

        let csv = LedgerTable::read_csv(&fx.output.path().join("2009.csv")).unwrap();
        assert_eq!(csv.headers, vec!["Ministry", "Gjöld"]);
        assert_eq!(csv.len(), 1);

        let progress = fx.progress();
        let entry = progress.get("2009.pdf").unwrap();
        assert!(entry.done);
        assert_eq!(entry.strategy.as_deref(), Some("table"));
    }

    #[test]
    fn test_ocr_fallback_writes_page_blocks() {
        let fx = Fixture::new(&["2010.pdf"]);
        let summary = fx.run(&fx.coordinator(scanned(3), vec![], true, false));

        assert_eq!(summary.ocr, 1);
        assert_eq!(summary.pages_ocred, 3);
        assert_eq!(
            fx.text("2010"),
            "=== PAGE 1 ===\nForsætisráðuneyti 1\n\n\
             === PAGE 2 ===\nForsætisráðuneyti 2\n\n\
             === PAGE 3 ===\nForsætisráðuneyti 3\n\n"
        );
        assert!(fx.progress().is_done("2010.pdf"));
    }

    #[test]
    fn test_second_run_skips_finished_documents() {
        let fx = Fixture::new(&["2010.pdf"]);
        fx.run(&fx.coordinator(scanned(2), vec![], true, false));
        let first = fx.text("2010");
        let calls = fx.calls.get();

        let summary = fx.run(&fx.coordinator(scanned(2), vec![], true, false));

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(fx.calls.get(), calls);
        assert_eq!(fx.text("2010"), first);
    }

    #[test]
    fn test_preview_then_resume() {
        let fx = Fixture::new(&["2011.pdf"]);
        fx.run(&fx.coordinator(scanned(3), vec![], true, true));

        let progress = fx.progress();
        let entry = progress.get("2011.pdf").unwrap();
        assert!(!entry.done);
        assert!(entry.preview);
        assert_eq!(entry.last_page_processed, 1);
        assert_eq!(fx.text("2011").matches("=== PAGE").count(), 1);

        let summary = fx.run(&fx.coordinator(scanned(3), vec![], true, false));
        assert_eq!(summary.pages_ocred, 2);

        let text = fx.text("2011");
        for page in 1..=3 {
            assert_eq!(text.matches(&format!("=== PAGE {} ===", page)).count(), 1);
        }
        assert!(fx.progress().is_done("2011.pdf"));
    }

    #[test]
    fn test_failed_page_is_recorded_and_skipped() {
        let fx = Fixture::new(&["2012.pdf"]);
        let summary = fx.run(&fx.coordinator(scanned(3), vec![2], true, false));

        assert_eq!(summary.pages_ocred, 2);
        assert_eq!(summary.pages_failed, 1);
        let progress = fx.progress();
        let entry = progress.get("2012.pdf").unwrap();
        assert!(entry.done);
        assert_eq!(entry.failed_pages, vec![2]);
        assert!(!fx.text("2012").contains("=== PAGE 2 ==="));
    }

    #[test]
    fn test_missing_backend_leaves_document_pending() {
        let fx = Fixture::new(&["2013.pdf"]);
        let mut statuses = Vec::new();
        let coordinator = fx.coordinator(scanned(2), vec![], false, false);
        let summary = coordinator
            .run_observed(fx.input.path(), fx.output.path(), |job, status| {
                statuses.push((job.name.clone(), status.clone()))
            })
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(statuses[0], ("2013.pdf".to_string(), DocumentStatus::Started));
        assert!(matches!(statuses[1].1, DocumentStatus::Failed(_)));

        let progress = fx.progress();
        let entry = progress.get("2013.pdf").unwrap();
        assert!(!entry.done);
        assert_eq!(entry.last_page_processed, 0);
        assert!(entry.last_error.as_deref().unwrap().contains("tesseract not found"));
    }

    #[test]
    fn test_batches_cover_every_document() {
        let fx = Fixture::new(&["a.pdf", "b.pdf", "c.pdf"]);
        let mut coordinator = fx.coordinator(scanned(1), vec![], true, false);
        coordinator.config.batch_size = 2;

        let mut batches = Vec::new();
        coordinator
            .run_observed(fx.input.path(), fx.output.path(), |job, status| {
                if *status == DocumentStatus::Started {
                    batches.push((job.name.clone(), job.batch));
                }
            })
            .unwrap();

        assert_eq!(
            batches,
            vec![
                ("a.pdf".to_string(), 1),
                ("b.pdf".to_string(), 1),
                ("c.pdf".to_string(), 2)
            ]
        );
    }
}
