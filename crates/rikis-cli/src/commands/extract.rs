//! Extract command - tables or OCR text from a directory of PDFs.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;

use rikis_core::extraction::{discover_documents, DocumentStatus};
use rikis_core::Coordinator;

use super::{file_progress, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Directory containing the PDFs
    input_dir: PathBuf,

    /// Directory for extracted CSV/text files and progress.json
    #[arg(short, long, default_value = "extracted")]
    output_dir: PathBuf,

    /// Process only the first page of each document
    #[arg(long)]
    preview: bool,

    /// Documents per batch
    #[arg(short, long)]
    batch_size: Option<usize>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.preview {
        config.extraction.preview = true;
    }
    if let Some(batch_size) = args.batch_size {
        config.extraction.batch_size = batch_size;
    }

    let documents = discover_documents(&args.input_dir)?;
    if documents.is_empty() {
        println!(
            "{} No PDFs found in {}",
            style("ℹ").blue(),
            args.input_dir.display()
        );
        return Ok(());
    }

    let coordinator = Coordinator::from_config(&config)?;
    let pb = file_progress(documents.len(), "documents")?;

    let summary = coordinator.run_observed(&args.input_dir, &args.output_dir, |job, status| {
        match status {
            DocumentStatus::Started => pb.set_message(job.name.clone()),
            DocumentStatus::Failed(reason) => {
                pb.println(format!("{} {}: {}", style("✗").red(), job.name, reason));
                pb.inc(1);
            }
            DocumentStatus::Skipped | DocumentStatus::Extracted { .. } => pb.inc(1),
        }
    })?;

    pb.finish_and_clear();

    if summary.processed == 0 {
        println!(
            "{} All {} documents already processed",
            style("✓").green(),
            summary.skipped
        );
        return Ok(());
    }

    println!(
        "{} Processed {} documents in {:.1}s",
        style("✓").green(),
        summary.processed,
        start.elapsed().as_secs_f64()
    );
    println!("  Tables:         {}", summary.table);
    println!(
        "  OCR:            {} ({} pages, {} failed)",
        summary.ocr, summary.pages_ocred, summary.pages_failed
    );
    println!("  Already done:   {}", summary.skipped);
    if summary.failed > 0 {
        println!(
            "  {}         {} (will be retried on the next run)",
            style("Failed:").red(),
            summary.failed
        );
    }
    println!(
        "  Progress:       {}",
        coordinator.progress_path(&args.output_dir).display()
    );

    Ok(())
}
