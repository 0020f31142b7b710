//! Parse command - segment OCR text into ministry line items.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, warn};

use rikis_core::mapping::concat_tables;
use rikis_core::{LedgerTable, Segmenter};

use super::{file_name, file_progress, files_in, load_config, stem};

/// Name of the combined table written next to the per-document tables.
const ALL_YEARS_FILE: &str = "all_years_parsed.csv";

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Directory containing OCR text files
    input_dir: PathBuf,

    /// Directory for parsed CSVs
    #[arg(short, long, default_value = "parsed")]
    output_dir: PathBuf,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let segmenter = Segmenter::new(&config.segmentation);

    let files = files_in(&args.input_dir, "*.txt")?;
    if files.is_empty() {
        println!(
            "{} No text files found in {}",
            style("ℹ").blue(),
            args.input_dir.display()
        );
        return Ok(());
    }
    fs::create_dir_all(&args.output_dir)?;

    let pb = file_progress(files.len(), "files")?;
    let mut tables = Vec::with_capacity(files.len());
    let mut total_items = 0;

    for path in &files {
        pb.set_message(file_name(path));
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                pb.inc(1);
                continue;
            }
        };

        let items = segmenter.segment_document(&text, &file_name(path));
        let table = LedgerTable::from_line_items(&items);
        let output = args.output_dir.join(format!("{}_parsed.csv", stem(path)));
        table.write_csv(&output)?;
        debug!("{} line items -> {}", items.len(), output.display());

        total_items += items.len();
        tables.push(table);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let combined_path = args.output_dir.join(ALL_YEARS_FILE);
    let combined = concat_tables(tables);
    combined.write_csv(&combined_path)?;

    println!(
        "{} Parsed {} line items from {} files",
        style("✓").green(),
        total_items,
        files.len()
    );
    println!("  Combined: {}", combined_path.display());

    Ok(())
}
