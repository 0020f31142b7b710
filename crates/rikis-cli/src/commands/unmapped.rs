//! Unmapped command - report ministries with no mapping.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use rikis_core::mapping::{collect_ministry_names, render_unknown_report};
use rikis_core::MappingStore;

use super::{files_in, load_config};

/// Arguments for the unmapped command.
#[derive(Args)]
pub struct UnmappedArgs {
    /// Directory containing normalized CSVs
    input_dir: PathBuf,

    /// Mapping CSV (code, ministry, category)
    #[arg(short, long)]
    mapping: PathBuf,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append the unknown names to the mapping file with an empty category
    #[arg(long)]
    append: bool,
}

pub async fn run(args: UnmappedArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut store = MappingStore::load(&args.mapping)?;

    let files = files_in(&args.input_dir, "*.csv")?;
    let names = collect_ministry_names(&files, &config.mapping.ministry_columns)?;
    let unknowns = store.find_unmapped(names);
    let report = render_unknown_report(&unknowns);

    match &args.output {
        Some(path) => {
            fs::write(path, &report)?;
            println!(
                "{} {} unknown ministries written to {}",
                style("✓").green(),
                unknowns.len(),
                path.display()
            );
        }
        None => print!("{}", report),
    }

    if args.append && !unknowns.is_empty() {
        let added = store.append_unmapped(unknowns.keys().map(String::as_str))?;
        println!(
            "{} Appended {} names to {}",
            style("✓").green(),
            added,
            store.path().display()
        );
    }

    Ok(())
}
