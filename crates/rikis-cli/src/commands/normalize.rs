//! Normalize command - attach mapped categories to extracted tables.

use std::path::PathBuf;

use clap::Args;
use console::style;

use rikis_core::mapping::{normalize_files, render_unknown_report};
use rikis_core::{MappingStore, MinistryMatcher};

use super::{files_in, load_config};

/// Arguments for the normalize command.
#[derive(Args)]
pub struct NormalizeArgs {
    /// Directory containing extracted or parsed CSVs
    input_dir: PathBuf,

    /// Mapping CSV (code, ministry, category)
    #[arg(short, long)]
    mapping: PathBuf,

    /// Directory for `<stem>_clean.csv` files
    #[arg(short, long, default_value = "normalized")]
    output_dir: PathBuf,

    /// Do not append unmapped names to the mapping file
    #[arg(long)]
    no_append: bool,
}

pub async fn run(args: NormalizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.no_append {
        config.mapping.append_unmapped = false;
    }

    let mut store = MappingStore::load(&args.mapping)?;
    let matcher = config
        .matching
        .canonicalize_before_mapping
        .then(|| MinistryMatcher::new(store.names(), &config.matching));

    let inputs: Vec<PathBuf> = files_in(&args.input_dir, "*.csv")?
        .into_iter()
        .filter(|p| !p.to_string_lossy().ends_with("_clean.csv"))
        .collect();
    if inputs.is_empty() {
        println!(
            "{} No CSV files found in {}",
            style("ℹ").blue(),
            args.input_dir.display()
        );
        return Ok(());
    }

    let summary = normalize_files(
        &inputs,
        &args.output_dir,
        &mut store,
        matcher.as_ref(),
        &config.mapping,
    )?;

    println!(
        "{} Normalized {} rows in {} files",
        style("✓").green(),
        summary.rows(),
        summary.files.len()
    );
    for skipped in &summary.skipped {
        println!(
            "  {} {} (no ministry column)",
            style("skipped").yellow(),
            skipped.display()
        );
    }
    if !summary.unmapped.is_empty() {
        println!(
            "  {} unmapped names, {} appended to {}",
            summary.unmapped.len(),
            summary.appended,
            store.path().display()
        );
        println!();
        print!("{}", render_unknown_report(&summary.unmapped));
    }

    Ok(())
}
