//! CLI application for Icelandic state-accounts ledger extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{aggregate, automap, config, extract, normalize, parse, resolve, unmapped};

/// rikis - Extract and classify ministry spending from state-accounts PDFs
#[derive(Parser)]
#[command(name = "rikis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract tables or OCR text from a directory of PDFs
    Extract(extract::ExtractArgs),

    /// Segment OCR text into ministry line items
    Parse(parse::ParseArgs),

    /// Fuzzy-match ministry names in OCR text and pick up their amounts
    Resolve(resolve::ResolveArgs),

    /// Attach categories from the mapping file to extracted tables
    Normalize(normalize::NormalizeArgs),

    /// Report ministries in normalized data that have no mapping
    Unmapped(unmapped::UnmappedArgs),

    /// Fill missing categories with an external classifier
    Automap(automap::AutomapArgs),

    /// Combine normalized tables into one master table
    Aggregate(aggregate::AggregateArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Parse(args) => parse::run(args, config_path).await,
        Commands::Resolve(args) => resolve::run(args, config_path).await,
        Commands::Normalize(args) => normalize::run(args, config_path).await,
        Commands::Unmapped(args) => unmapped::run(args, config_path).await,
        Commands::Automap(args) => automap::run(args, config_path).await,
        Commands::Aggregate(args) => aggregate::run(args, config_path).await,
        Commands::Config(args) => config::run(args).await,
    }
}
