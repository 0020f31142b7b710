//! Subcommand implementations.

pub mod aggregate;
pub mod automap;
pub mod config;
pub mod extract;
pub mod normalize;
pub mod parse;
pub mod resolve;
pub mod unmapped;

use std::path::{Path, PathBuf};

use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};

use rikis_core::models::config::RikisConfig;

/// Load the configuration from `--config`, or the defaults.
///
/// An explicit path that cannot be read is fatal.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RikisConfig> {
    match config_path {
        Some(path) => RikisConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e)),
        None => Ok(RikisConfig::default()),
    }
}

/// Files in `dir` matching `pattern` (e.g. `*.txt`), sorted.
pub fn files_in(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", dir.display());
    }
    let pattern = dir.join(pattern);
    let mut files: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// File stem as an owned string.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name as an owned string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Bar over `len` files.
pub fn file_progress(len: usize, unit: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} {{msg}}",
                unit
            ))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
