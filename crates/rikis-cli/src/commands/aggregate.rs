//! Aggregate command - combine normalized tables into one master table.

use std::path::PathBuf;

use clap::Args;
use console::style;

use rikis_core::mapping::{aggregate_tables, read_tables};

use super::{files_in, load_config};

/// Arguments for the aggregate command.
#[derive(Args)]
pub struct AggregateArgs {
    /// Directory containing normalized `*_clean.csv` files
    input_dir: PathBuf,

    /// Master table to write
    #[arg(short, long, default_value = "master_aggregated.csv")]
    output: PathBuf,

    /// File pattern inside the input directory
    #[arg(long, default_value = "*_clean.csv")]
    pattern: String,
}

pub async fn run(args: AggregateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    // Only validates --config; aggregation has no tunables
    load_config(config_path)?;

    let files = files_in(&args.input_dir, &args.pattern)?;
    if files.is_empty() {
        println!(
            "{} No files matching {} in {}",
            style("ℹ").blue(),
            args.pattern,
            args.input_dir.display()
        );
        return Ok(());
    }

    let tables = read_tables(&files);
    let read = tables.len();
    let master = aggregate_tables(tables);
    master.write_csv(&args.output)?;

    println!(
        "{} Aggregated {} rows from {} of {} files into {}",
        style("✓").green(),
        master.len(),
        read,
        files.len(),
        args.output.display()
    );

    Ok(())
}
