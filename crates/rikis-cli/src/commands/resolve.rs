//! Resolve command - fuzzy-match ministry names in OCR text.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use rikis_core::extraction::DocumentSource;
use rikis_core::pdf::PdfDocumentSource;
use rikis_core::{MappingStore, MinistryAmount, MinistryMatcher};

use super::{file_name, files_in, load_config, stem};

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Directory containing OCR text files
    input_dir: PathBuf,

    /// Mapping CSV whose ministry column is the canonical name list
    #[arg(short, long)]
    mapping: PathBuf,

    /// Directory with the source PDFs, used when the text yields no matches
    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Directory for the per-document results
    #[arg(short, long, default_value = "resolved")]
    output_dir: PathBuf,
}

pub async fn run(args: ResolveArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = MappingStore::load(&args.mapping)?;
    let matcher = MinistryMatcher::new(store.names(), &config.matching);
    if matcher.is_empty() {
        anyhow::bail!("No ministry names in {}", args.mapping.display());
    }

    let files = files_in(&args.input_dir, "*.txt")?;
    fs::create_dir_all(&args.output_dir)?;
    let source = PdfDocumentSource::new(config.pdf.table_min_rows);

    let mut total = 0;
    let mut from_tables = 0;
    for path in &files {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let mut found = matcher.scan_lines(&text);
        if found.is_empty() {
            if let Some(pdf) = args.pdf_dir.as_deref().and_then(|dir| source_pdf(dir, path)) {
                found = scan_pdf_tables(&source, &matcher, &pdf);
                if !found.is_empty() {
                    from_tables += 1;
                }
            }
        }

        let output = args.output_dir.join(format!("{}_ministries.csv", stem(path)));
        write_results(&output, &found)?;
        info!("{}: {} ministries -> {}", file_name(path), found.len(), output.display());
        total += found.len();
    }

    println!(
        "{} Matched {} ministry amounts in {} files ({} from PDF tables)",
        style("✓").green(),
        total,
        files.len(),
        from_tables
    );

    Ok(())
}

/// Same-stem PDF next to a text file's name.
fn source_pdf(pdf_dir: &Path, text_path: &Path) -> Option<PathBuf> {
    let pdf = pdf_dir.join(format!("{}.pdf", stem(text_path)));
    pdf.is_file().then_some(pdf)
}

fn scan_pdf_tables(
    source: &PdfDocumentSource,
    matcher: &MinistryMatcher,
    pdf: &Path,
) -> Vec<MinistryAmount> {
    match source.tables(pdf) {
        Ok(tables) => {
            debug!("{}: {} tables", pdf.display(), tables.len());
            tables
                .iter()
                .flat_map(|table| matcher.scan_table_rows(&table.rows))
                .collect()
        }
        Err(e) => {
            warn!("No tables from {}: {}", pdf.display(), e);
            Vec::new()
        }
    }
}

fn write_results(path: &Path, found: &[MinistryAmount]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if found.is_empty() {
        writer.write_record(["Ministry", "Raw Category", "Amount"])?;
    }
    for record in found {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
