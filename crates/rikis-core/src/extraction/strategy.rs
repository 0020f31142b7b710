//! Table and OCR extraction strategies.

use std::fs::OpenOptions;
use std::io::Write;

use tracing::{debug, info, warn};

use super::{DocumentJob, ExtractionContext, ExtractionReport, ExtractionStrategy, StrategyOutcome};
use crate::error::OcrError;
use crate::mapping::concat_tables;
use crate::models::config::{OcrConfig, PdfConfig};
use crate::ocr::{recognize_with_fallback, render_adaptive, OcrBackend, PageRenderer};
use crate::pdf::filter_ministry_rows;

/// Structured tables from the PDF text layer.
#[derive(Debug, Clone, Default)]
pub struct TableStrategy {
    config: PdfConfig,
}

impl TableStrategy {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }
}

impl ExtractionStrategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn extract(&self, job: &mut DocumentJob, ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let tables = match ctx.source.tables(&job.path) {
            Ok(tables) => tables,
            Err(e) => return StrategyOutcome::Failed(format!("table extraction: {}", e)),
        };
        if tables.is_empty() {
            debug!("{}: no tables", job.name);
            return StrategyOutcome::Empty;
        }

        let count = tables.len();
        let combined = concat_tables(tables.into_iter().map(|table| {
            filter_ministry_rows(table, &self.config.ministry_column_fragments).into_table()
        }));

        let output = ctx.output_dir.join(format!("{}.csv", job.stem()));
        if let Err(e) = combined.write_csv(&output) {
            return StrategyOutcome::Failed(format!("writing {}: {}", output.display(), e));
        }

        let total = ctx.source.page_count(&job.path).unwrap_or(0);
        ctx.progress.mark_done(&job.name, self.name(), total);
        if let Err(e) = ctx.progress.save() {
            return StrategyOutcome::Failed(format!("saving progress: {}", e));
        }
        job.total_pages = total;
        job.last_page_processed = total;
        job.done = true;

        info!(
            "{}: {} tables, {} rows -> {}",
            job.name,
            count,
            combined.len(),
            output.display()
        );
        StrategyOutcome::Extracted(ExtractionReport {
            output,
            pages_processed: 0,
            pages_failed: 0,
            complete: true,
        })
    }
}

/// Page-by-page OCR into `<stem>.txt`.
pub struct OcrStrategy {
    renderer: Box<dyn PageRenderer>,
    backend: Box<dyn OcrBackend>,
    config: OcrConfig,
}

impl OcrStrategy {
    pub fn new(renderer: Box<dyn PageRenderer>, backend: Box<dyn OcrBackend>, config: OcrConfig) -> Self {
        Self {
            renderer,
            backend,
            config,
        }
    }

    fn ocr_page(&self, job: &DocumentJob, page: u32) -> Result<String, OcrError> {
        let image = render_adaptive(self.renderer.as_ref(), &job.path, page, &self.config)?;
        recognize_with_fallback(self.backend.as_ref(), &image, &self.config)
    }
}

impl ExtractionStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract(&self, job: &mut DocumentJob, ctx: &mut ExtractionContext<'_>) -> StrategyOutcome {
        let total = match ctx.source.page_count(&job.path) {
            Ok(0) => return StrategyOutcome::Empty,
            Ok(n) => n,
            Err(e) => return StrategyOutcome::Failed(format!("page count: {}", e)),
        };
        job.total_pages = total;

        let start = job.next_page();
        let end = if ctx.preview { total.min(1) } else { total };
        let output = ctx.output_dir.join(format!("{}.txt", job.stem()));

        if start > 1 {
            info!("{}: resuming at page {} of {}", job.name, start, total);
        } else if output.exists() {
            // Pages from a run that never recorded progress
            if let Err(e) = std::fs::remove_file(&output) {
                return StrategyOutcome::Failed(format!("removing stale {}: {}", output.display(), e));
            }
        }

        let mut report = ExtractionReport {
            output: output.clone(),
            pages_processed: 0,
            pages_failed: 0,
            complete: false,
        };

        for page in start..=end {
            let failed = match self.ocr_page(job, page) {
                Ok(text) => {
                    if let Err(e) = append_page(&output, page, &text) {
                        return StrategyOutcome::Failed(format!("writing {}: {}", output.display(), e));
                    }
                    report.pages_processed += 1;
                    false
                }
                // Nothing will succeed without the tool; leave the cursor alone
                Err(e @ OcrError::BackendNotAvailable(_)) => {
                    return StrategyOutcome::Failed(e.to_string());
                }
                Err(e) => {
                    warn!("{}: OCR failed on page {}: {}", job.name, page, e);
                    report.pages_failed += 1;
                    true
                }
            };

            ctx.progress.record_page(&job.name, self.name(), page, total, failed);
            if let Err(e) = ctx.progress.save() {
                return StrategyOutcome::Failed(format!("saving progress: {}", e));
            }
            job.last_page_processed = page;
            debug!("{}: page {}/{} done", job.name, page, total);
        }

        if ctx.preview && job.last_page_processed < total {
            ctx.progress.mark_preview(&job.name);
        } else {
            ctx.progress.mark_done(&job.name, self.name(), total);
            job.done = true;
            report.complete = true;
        }
        if let Err(e) = ctx.progress.save() {
            return StrategyOutcome::Failed(format!("saving progress: {}", e));
        }

        info!(
            "{}: OCR'd {} pages ({} failed) -> {}",
            job.name,
            report.pages_processed,
            report.pages_failed,
            output.display()
        );
        StrategyOutcome::Extracted(report)
    }
}

/// Append one page block, reopening the file so earlier pages survive a crash.
fn append_page(path: &std::path::Path, page: u32, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "=== PAGE {} ===\n{}\n\n", page, text.trim())?;
    file.flush()
}
