//! Concatenation of per-document tables into master tables.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::models::{LedgerTable, NormalizedCategory, NormalizedRecord};

/// Column recording which file a row came from.
pub const SOURCE_COLUMN: &str = "source_file";

/// Column that must be non-empty for a row to be aggregated.
pub const MINISTRY_COLUMN: &str = "Ministry";

/// Concatenate tables over the union of their headers.
///
/// Columns keep first-seen order. Rows missing a column get an empty cell.
pub fn concat_tables<I>(tables: I) -> LedgerTable
where
    I: IntoIterator<Item = LedgerTable>,
{
    let tables: Vec<LedgerTable> = tables.into_iter().collect();

    let mut headers: Vec<String> = Vec::new();
    for table in &tables {
        for header in &table.headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }
    }

    let mut master = LedgerTable::new(headers);
    for table in &tables {
        let positions: Vec<Option<usize>> = master
            .headers
            .iter()
            .map(|h| table.headers.iter().position(|t| t == h))
            .collect();

        for row in 0..table.len() {
            master.rows.push(
                positions
                    .iter()
                    .map(|p| p.map(|col| table.cell(row, col).to_string()).unwrap_or_default())
                    .collect(),
            );
        }
    }
    master
}

/// Keep rows with a ministry and a resolved category, tagged with their source.
///
/// Tables without a `Ministry` column are skipped. Tables without a
/// `normalized_category` column keep every row that has a ministry.
pub fn filter_resolved(name: &str, table: &LedgerTable) -> Option<LedgerTable> {
    let Some(ministry_col) = table.headers.iter().position(|h| h == MINISTRY_COLUMN) else {
        warn!("{} has no {} column, skipping", name, MINISTRY_COLUMN);
        return None;
    };
    let category_col = table
        .headers
        .iter()
        .position(|h| h == NormalizedRecord::CATEGORY_COLUMN);

    let mut filtered = LedgerTable::new(table.headers.clone());
    filtered.rows = table
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| !table.cell(*i, ministry_col).trim().is_empty())
        .filter(|(i, _)| match category_col {
            Some(col) => NormalizedCategory::from_label(table.cell(*i, col)).is_resolved(),
            None => true,
        })
        .map(|(_, row)| row.clone())
        .collect();

    let sources = vec![name.to_string(); filtered.len()];
    filtered.set_column(SOURCE_COLUMN, sources);
    Some(filtered)
}

/// Aggregate named normalized tables into one master table.
pub fn aggregate_tables<I>(tables: I) -> LedgerTable
where
    I: IntoIterator<Item = (String, LedgerTable)>,
{
    let kept: Vec<LedgerTable> = tables
        .into_iter()
        .filter_map(|(name, table)| {
            let filtered = filter_resolved(&name, &table)?;
            debug!("{}: kept {} of {} rows", name, filtered.len(), table.len());
            (!filtered.is_empty()).then_some(filtered)
        })
        .collect();

    let master = concat_tables(kept);
    info!("Aggregated {} rows", master.len());
    master
}

/// Read CSVs, skipping unreadable ones, paired with their file names.
pub fn read_tables(paths: &[PathBuf]) -> Vec<(String, LedgerTable)> {
    paths
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match LedgerTable::read_csv(path) {
                Ok(table) => Some((name, table)),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], rows: &[&[&str]]) -> LedgerTable {
        LedgerTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_concat_union_of_headers() {
        let a = table(&["Ministry", "Amount"], &[&["A", "1"]]);
        let b = table(&["Ministry", "Year"], &[&["B", "2009"]]);

        let master = concat_tables([a, b]);
        assert_eq!(master.headers, vec!["Ministry", "Amount", "Year"]);
        assert_eq!(master.rows, vec![vec!["A", "1", ""], vec!["B", "", "2009"]]);
    }

    #[test]
    fn test_aggregate_keeps_resolved_rows() {
        let a = table(
            &["Ministry", "normalized_category"],
            &[
                &["Fjármálaráðuneyti", "Finance & Economy"],
                &["Hafrannsóknastofnun", "unmapped"],
                &["Vegagerðin", "Misc/Missing"],
                &["", "Health"],
            ],
        );
        let b = table(&["Nr"], &[&["1"]]);
        let c = table(&["Ministry", "normalized_category"], &[&["X", "unmapped"]]);

        let master = aggregate_tables([
            ("a_clean.csv".to_string(), a),
            ("b_clean.csv".to_string(), b),
            ("c_clean.csv".to_string(), c),
        ]);

        assert_eq!(
            master.headers,
            vec!["Ministry", "normalized_category", "source_file"]
        );
        assert_eq!(
            master.rows,
            vec![vec!["Fjármálaráðuneyti", "Finance & Economy", "a_clean.csv"]]
        );
    }

    #[test]
    fn test_table_without_category_keeps_ministry_rows() {
        let a = table(&["Ministry"], &[&["Forsætisráðuneyti"], &[" "]]);
        let filtered = filter_resolved("a.csv", &a).unwrap();
        assert_eq!(filtered.rows, vec![vec!["Forsætisráðuneyti", "a.csv"]]);
    }
}
