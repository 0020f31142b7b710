//! Table detection on the PDF text layer.
//!
//! pdf-extract keeps column gaps as runs of spaces, so a table shows up as
//! consecutive lines that split into several cells on tabs or wide gaps.

use tracing::{debug, warn};

use crate::ledger::rules::{is_ministry, CELL_SEPARATOR};
use crate::models::LedgerTable;

/// Header given to the ministry column of a filtered table.
pub const MINISTRY_HEADER: &str = "Ministry";

/// Split a text-layer line into trimmed, non-empty cells.
pub fn split_cells(line: &str) -> Vec<String> {
    CELL_SEPARATOR
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn build_table(run: Vec<Vec<String>>) -> LedgerTable {
    let mut rows = run.into_iter();
    let mut headers = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    while headers.len() < width {
        headers.push(format!("column_{}", headers.len() + 1));
    }

    let mut table = LedgerTable::new(headers);
    table.rows = rows
        .into_iter()
        .map(|mut row| {
            row.resize(table.headers.len(), String::new());
            row
        })
        .collect();
    table
}

/// Find tables: runs of at least `min_rows` consecutive multi-cell lines.
/// The first line of a run is the header.
pub fn detect_tables(text: &str, min_rows: usize) -> Vec<LedgerTable> {
    let min_rows = min_rows.max(2);
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    let mut close_run = |run: &mut Vec<Vec<String>>| {
        if run.len() >= min_rows {
            tables.push(build_table(std::mem::take(run)));
        } else {
            run.clear();
        }
    };

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            run.push(cells);
        } else {
            close_run(&mut run);
        }
    }
    close_run(&mut run);

    debug!("Detected {} tables", tables.len());
    tables
}

/// Result of filtering a table down to ministry rows.
#[derive(Debug, Clone, PartialEq)]
pub enum MinistryRows {
    /// Ministry column found; rows filtered and the column renamed.
    Filtered(LedgerTable),
    /// No ministry column; the table is unchanged.
    NoMinistryColumn(LedgerTable),
}

impl MinistryRows {
    pub fn into_table(self) -> LedgerTable {
        match self {
            MinistryRows::Filtered(t) | MinistryRows::NoMinistryColumn(t) => t,
        }
    }
}

/// Keep rows whose ministry cell plausibly names a ministry.
///
/// The ministry column is the first header containing one of `fragments`.
pub fn filter_ministry_rows(mut table: LedgerTable, fragments: &[String]) -> MinistryRows {
    let Some(col) = table.find_column_containing(fragments) else {
        warn!(
            "No ministry column among {:?}, keeping table unfiltered",
            table.headers
        );
        return MinistryRows::NoMinistryColumn(table);
    };

    let before = table.len();
    table.headers[col] = MINISTRY_HEADER.to_string();
    table.rows.retain(|row| row.get(col).is_some_and(|c| is_ministry(c)));
    debug!("Kept {} of {} rows with ministry names", table.len(), before);

    MinistryRows::Filtered(table)
}
