//! Automap command - fill missing categories with an external classifier.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use clap::Args;
use console::style;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use rikis_core::error::MappingError;
use rikis_core::mapping::classifier::classification_prompt;
use rikis_core::mapping::{suggest_categories, CategoryClassifier};
use rikis_core::models::config::ClassifierConfig;
use rikis_core::{Category, MappingStore};

use super::{file_progress, load_config};

/// Arguments for the automap command.
#[derive(Args)]
pub struct AutomapArgs {
    /// Mapping CSV (code, ministry, category)
    #[arg(short, long)]
    mapping: PathBuf,

    /// Show suggestions without writing them
    #[arg(long)]
    dry_run: bool,
}

/// Classifier that runs an external program with the prompt on stdin and
/// reads the label from stdout.
pub struct CommandClassifier {
    config: ClassifierConfig,
}

impl CommandClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    async fn classify_async(&self, prompt: String) -> Result<String, MappingError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MappingError::Classifier(format!("{}: {}", self.config.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| MappingError::Classifier(e.to_string()))?;
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                MappingError::Classifier(format!("timed out after {}s", self.config.timeout_secs))
            })?
            .map_err(|e| MappingError::Classifier(e.to_string()))?;

        if !output.status.success() {
            return Err(MappingError::Classifier(format!(
                "{} exited with {}",
                self.config.command, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CategoryClassifier for CommandClassifier {
    fn classify(&self, name: &str, categories: &[Category]) -> Result<String, MappingError> {
        let prompt = classification_prompt(name, categories);
        debug!("classifying {:?}", name);
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.classify_async(prompt))
        })
    }
}

pub async fn run(args: AutomapArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut store = MappingStore::load(&args.mapping)?;

    let pending: Vec<String> = store
        .entries()
        .iter()
        .filter(|e| e.category.trim().is_empty())
        .map(|e| e.name.clone())
        .collect();
    if pending.is_empty() {
        println!("{} Every ministry already has a category", style("✓").green());
        return Ok(());
    }

    println!(
        "{} Classifying {} ministries with {}",
        style("ℹ").blue(),
        pending.len(),
        config.classifier.command
    );

    let classifier = CommandClassifier::new(config.classifier.clone());
    let pb = file_progress(pending.len(), "names")?;
    let mut suggestions = Vec::with_capacity(pending.len());
    for name in &pending {
        pb.set_message(name.clone());
        suggestions.extend(suggest_categories([name.as_str()], &classifier));
        pb.inc(1);
    }
    pb.finish_and_clear();

    for (name, category) in &suggestions {
        println!("  {} => {}", name, style(category).cyan());
    }

    if args.dry_run {
        println!("{} Dry run, mapping left unchanged", style("ℹ").blue());
        return Ok(());
    }

    let report = store.merge_suggestions(suggestions)?;
    println!(
        "{} {} filled, {} added, {} kept as they were",
        style("✓").green(),
        report.filled.len(),
        report.added.len(),
        report.rejected.len()
    );

    Ok(())
}
