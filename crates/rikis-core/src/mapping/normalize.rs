//! Category normalization of structured CSV tables.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::store::MappingStore;
use crate::error::Result;
use crate::ledger::matcher::MinistryMatcher;
use crate::ledger::rules::parse_cell_amount;
use crate::models::config::MappingConfig;
use crate::models::{LedgerTable, NormalizedCategory, NormalizedRecord};

/// Column holding amounts converted to millions of ISK.
pub const MILLION_COLUMN: &str = "amount_million_isk";

/// Header of the unmapped list file.
pub const UNMAPPED_HEADER: &str = "Unmapped_Ministry";

/// Fragments that identify an amount column.
const AMOUNT_FRAGMENTS: [&str; 2] = ["amount", "kr"];

/// Result of normalizing one file.
#[derive(Debug, Clone)]
pub struct NormalizedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    /// Distinct names in this file that did not resolve.
    pub unmapped: BTreeSet<String>,
}

/// Totals for a normalization run.
#[derive(Debug, Clone, Default)]
pub struct NormalizeSummary {
    pub files: Vec<NormalizedFile>,
    /// Files without a ministry column.
    pub skipped: Vec<PathBuf>,
    /// Every unmapped name, with the files it appeared in.
    pub unmapped: BTreeMap<String, BTreeSet<String>>,
    /// Rows appended to the mapping table.
    pub appended: usize,
}

impl NormalizeSummary {
    pub fn rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

/// Applies a mapping table to structured tables.
pub struct Normalizer<'a> {
    store: &'a MappingStore,
    matcher: Option<&'a MinistryMatcher>,
    config: &'a MappingConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(store: &'a MappingStore, config: &'a MappingConfig) -> Self {
        Self {
            store,
            matcher: None,
            config,
        }
    }

    /// Canonicalize names through `matcher` before looking them up.
    pub fn with_matcher(mut self, matcher: &'a MinistryMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Name used for the mapping lookup.
    fn lookup_name(&self, raw: &str) -> String {
        match self.matcher {
            Some(matcher) => matcher.canonicalize(raw),
            None => raw.trim().to_string(),
        }
    }

    /// Add `normalized_category` (and `amount_million_isk` when an amount
    /// column exists) to a table.
    ///
    /// Returns the unmapped names, or `None` when the table has no ministry
    /// column.
    pub fn normalize_table(&self, table: &mut LedgerTable) -> Option<BTreeSet<String>> {
        let ministry_col = table.find_column(&self.config.ministry_columns)?;

        let mut unmapped = BTreeSet::new();
        let mut categories = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let raw = table.cell(row, ministry_col).trim();
            if raw.is_empty() {
                categories.push(NormalizedCategory::Unmapped.label().to_string());
                continue;
            }

            let name = self.lookup_name(raw);
            let category = self.store.resolve(&name);
            if category == NormalizedCategory::Unmapped {
                unmapped.insert(name);
            }
            categories.push(category.label().to_string());
        }

        let amount_col = table.headers.iter().position(|h| {
            let h = h.to_lowercase();
            h != MILLION_COLUMN && AMOUNT_FRAGMENTS.iter().any(|f| h.contains(f))
        });
        if let Some(col) = amount_col {
            let millions: Vec<String> = (0..table.len())
                .map(|row| {
                    parse_cell_amount(table.cell(row, col))
                        .map(|v| (v / Decimal::from(1000)).normalize().to_string())
                        .unwrap_or_default()
                })
                .collect();
            table.set_column(MILLION_COLUMN, millions);
        }

        table.set_column(NormalizedRecord::CATEGORY_COLUMN, categories);
        Some(unmapped)
    }

    /// Normalize one CSV into `<stem>_clean.csv` in `output_dir`.
    ///
    /// Returns `None` (after a warning) when the file has no ministry column.
    pub fn normalize_file(&self, input: &Path, output_dir: &Path) -> Result<Option<NormalizedFile>> {
        let mut table = LedgerTable::read_csv(input)?;
        let Some(unmapped) = self.normalize_table(&mut table) else {
            warn!(
                "No ministry column in {} (expected one of {:?}), skipping",
                input.display(),
                self.config.ministry_columns
            );
            return Ok(None);
        };

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = output_dir.join(format!("{}_clean.csv", stem));
        table.write_csv(&output)?;

        if !unmapped.is_empty() {
            warn!("{}: {} unmapped names", input.display(), unmapped.len());
        }
        debug!("Normalized {} -> {}", input.display(), output.display());

        Ok(Some(NormalizedFile {
            input: input.to_path_buf(),
            output,
            rows: table.len(),
            unmapped,
        }))
    }
}

/// Normalize a set of CSVs and record what did not map.
///
/// Writes the unmapped list next to the mapping file and, when
/// `config.append_unmapped` is set, appends plausible ministry names to the
/// mapping table with an empty category.
pub fn normalize_files(
    inputs: &[PathBuf],
    output_dir: &Path,
    store: &mut MappingStore,
    matcher: Option<&MinistryMatcher>,
    config: &MappingConfig,
) -> Result<NormalizeSummary> {
    std::fs::create_dir_all(output_dir)?;
    let mut summary = NormalizeSummary::default();

    {
        let mut normalizer = Normalizer::new(store, config);
        if let Some(matcher) = matcher {
            normalizer = normalizer.with_matcher(matcher);
        }

        for input in inputs {
            let file_name = input
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match normalizer.normalize_file(input, output_dir) {
                Ok(Some(file)) => {
                    for name in &file.unmapped {
                        summary
                            .unmapped
                            .entry(name.clone())
                            .or_default()
                            .insert(file_name.clone());
                    }
                    summary.files.push(file);
                }
                Ok(None) => summary.skipped.push(input.clone()),
                Err(e) => {
                    warn!("Failed to normalize {}: {}", input.display(), e);
                    summary.skipped.push(input.clone());
                }
            }
        }
    }

    let unmapped_path = store
        .path()
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&config.unmapped_file);
    write_unmapped_list(&unmapped_path, summary.unmapped.keys().map(String::as_str))?;
    info!(
        "{} unmapped names written to {}",
        summary.unmapped.len(),
        unmapped_path.display()
    );

    if config.append_unmapped {
        let plausible = store.find_unmapped(
            summary
                .unmapped
                .iter()
                .flat_map(|(name, files)| files.iter().map(move |f| (name.as_str(), f.clone()))),
        );
        summary.appended = store.append_unmapped(plausible.keys().map(String::as_str))?;
    }

    Ok(summary)
}

/// Write a one-column list of unmapped names.
pub fn write_unmapped_list<'a, I>(path: &Path, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table = LedgerTable::new(vec![UNMAPPED_HEADER.to_string()]);
    table.rows = names.into_iter().map(|n| vec![n.to_string()]).collect();
    table.write_csv(path)
}

/// Collect `(ministry name, file name)` pairs from normalized tables.
///
/// Files without a ministry column are skipped.
pub fn collect_ministry_names(
    paths: &[PathBuf],
    ministry_columns: &[String],
) -> Result<Vec<(String, String)>> {
    let mut names = Vec::new();
    for path in paths {
        let table = match LedgerTable::read_csv(path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let Some(col) = table.find_column(ministry_columns) else {
            continue;
        };
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        for row in 0..table.len() {
            let name = table.cell(row, col).trim();
            if !name.is_empty() {
                names.push((name.to_string(), file_name.clone()));
            }
        }
    }
    Ok(names)
}
