//! Ministry → category mapping table.
//!
//! The table is a CSV with at least three columns: a line code, the raw
//! ministry name and its category. Names are unique under
//! case/whitespace-insensitive comparison. Names seen in data without a
//! mapping are appended with an empty category, so the file itself records
//! what still needs mapping.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{MappingError, Result};
use crate::ledger::rules::{is_probable_ministry, name_key};
use crate::models::{Category, NormalizedCategory};
use crate::storage::write_atomic;

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Line code (may be empty for appended rows).
    pub code: String,
    /// Raw ministry name as it appears in the data.
    pub name: String,
    /// Category label, empty while unmapped.
    pub category: String,
    /// Any columns after the third, kept as-is.
    pub extra: Vec<String>,
}

impl MappingEntry {
    fn new(name: &str, category: &str) -> Self {
        Self {
            code: String::new(),
            name: name.trim().to_string(),
            category: category.to_string(),
            extra: Vec::new(),
        }
    }

    pub fn normalized_category(&self) -> NormalizedCategory {
        if self.category.trim().is_empty() {
            NormalizedCategory::Unmapped
        } else {
            NormalizedCategory::Mapped(Category::coerce(&self.category))
        }
    }
}

/// Outcome of merging category suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Names that were not in the table.
    pub added: Vec<String>,
    /// Names that were present with an empty category.
    pub filled: Vec<String>,
    /// Names that already had a category.
    pub rejected: Vec<String>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.filled.is_empty()
    }
}

/// CSV-backed mapping store.
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
    headers: Vec<String>,
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl MappingStore {
    /// Default headers for a new table.
    pub const DEFAULT_HEADERS: [&'static str; 3] = ["LineCode", "Ministry", "Category"];

    /// Empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            headers: Self::DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load a mapping table. Later rows win over earlier duplicates.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MappingError::NotFound(path.to_path_buf()).into());
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.len() < 3 {
            return Err(MappingError::Schema {
                path: path.to_path_buf(),
                found: headers.len(),
            }
            .into());
        }

        let mut store = Self {
            path: path.to_path_buf(),
            headers,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        let mut duplicates = 0;
        for record in reader.records() {
            let record = record?;
            let name = record.get(1).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }

            let mut category = record.get(2).unwrap_or("").trim().to_string();
            if !category.is_empty() && Category::from_label(&category).is_none() {
                warn!(
                    "unknown category {:?} for {:?}, using {}",
                    category,
                    name,
                    Category::MiscMissing
                );
                category = Category::MiscMissing.label().to_string();
            }

            let entry = MappingEntry {
                code: record.get(0).unwrap_or("").to_string(),
                name: name.to_string(),
                category,
                extra: record.iter().skip(3).map(|c| c.to_string()).collect(),
            };
            if store.upsert(entry) {
                duplicates += 1;
            }
        }

        info!(
            "Loaded {} mappings from {} ({} duplicates collapsed)",
            store.entries.len(),
            path.display(),
            duplicates
        );
        Ok(store)
    }

    /// Insert or replace by key. Returns true when an entry was replaced.
    fn upsert(&mut self, entry: MappingEntry) -> bool {
        let key = name_key(&entry.name);
        match self.index.get(&key) {
            Some(&i) => {
                self.entries[i] = entry;
                true
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Raw names in table order, used as the canonical ministry list.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn get(&self, raw: &str) -> Option<&MappingEntry> {
        self.index.get(&name_key(raw)).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.get(raw).is_some()
    }

    /// Category for a raw name. Missing rows and empty categories are unmapped.
    pub fn resolve(&self, raw: &str) -> NormalizedCategory {
        self.get(raw)
            .map(MappingEntry::normalized_category)
            .unwrap_or(NormalizedCategory::Unmapped)
    }

    /// Unresolvable names that look like real ministries, with every
    /// source they were seen in.
    ///
    /// Spellings that differ only in case or spacing are one name, reported
    /// under the first spelling seen.
    pub fn find_unmapped<I, N, S>(&self, names: I) -> BTreeMap<String, BTreeSet<String>>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: Into<String>,
    {
        let mut unmapped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut spellings: HashMap<String, String> = HashMap::new();
        for (name, source) in names {
            let name = name.as_ref().trim();
            if name.is_empty() || self.resolve(name) != NormalizedCategory::Unmapped {
                continue;
            }
            if !is_probable_ministry(name) {
                continue;
            }
            let spelling = spellings
                .entry(name_key(name))
                .or_insert_with(|| name.to_string());
            unmapped
                .entry(spelling.clone())
                .or_default()
                .insert(source.into());
        }
        unmapped
    }

    /// Append names not yet in the table with an empty category, then save.
    ///
    /// Returns the number of rows added.
    pub fn append_unmapped<'a, I>(&mut self, names: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.trim();
            if name.is_empty() || self.contains(name) {
                continue;
            }
            self.upsert(MappingEntry::new(name, ""));
            added += 1;
        }

        if added > 0 {
            info!("Appending {} unmapped names to {}", added, self.path.display());
            self.save()?;
        }
        Ok(added)
    }

    /// Merge `(name, category)` suggestions, then save.
    ///
    /// Names already carrying a category are rejected. Names present with an
    /// empty category are filled. Merging the same suggestions twice changes
    /// nothing the second time.
    pub fn merge_suggestions<I, S>(&mut self, suggestions: I) -> Result<MergeReport>
    where
        I: IntoIterator<Item = (S, Category)>,
        S: AsRef<str>,
    {
        let mut report = MergeReport::default();

        for (name, category) in suggestions {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }

            match self.index.get(&name_key(name)) {
                Some(&i) if !self.entries[i].category.trim().is_empty() => {
                    debug!("keeping existing mapping for {:?}", name);
                    report.rejected.push(name.to_string());
                }
                Some(&i) => {
                    self.entries[i].category = category.label().to_string();
                    report.filled.push(name.to_string());
                }
                None => {
                    self.upsert(MappingEntry::new(name, category.label()));
                    report.added.push(name.to_string());
                }
            }
        }

        if report.changed() {
            self.save()?;
        }
        info!(
            "Merged suggestions: {} added, {} filled, {} rejected",
            report.added.len(),
            report.filled.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Persist the table atomically.
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, |file| {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
            writer.write_record(&self.headers)?;
            for entry in &self.entries {
                let mut row = vec![entry.code.as_str(), entry.name.as_str(), entry.category.as_str()];
                row.extend(entry.extra.iter().map(String::as_str));
                writer.write_record(&row)?;
            }
            writer.flush()?;
            Ok(())
        })
    }
}

/// Render the unknown-ministries report.
pub fn render_unknown_report(unknowns: &BTreeMap<String, BTreeSet<String>>) -> String {
    if unknowns.is_empty() {
        return "All ministries in normalized data are mapped.\n".to_string();
    }

    let mut report = String::from("True unknown ministries (not in mappings):\n\n");
    for (name, sources) in unknowns {
        let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
        report.push_str(&format!("- {}    [found in: {}]\n", name, sources.join(", ")));
    }
    report
}
