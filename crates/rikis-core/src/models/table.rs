//! Generic CSV-backed table used between pipeline stages.
//!
//! Structured tables coming out of PDFs keep whatever columns the source
//! document had, so later stages work on headers and string rows rather than
//! a fixed record type.

use std::path::Path;

use crate::error::Result;
use crate::models::record::{LineItem, NormalizedRecord};
use crate::storage::write_atomic;

/// A table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LedgerTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first header equal (case-insensitive, trimmed) to any of `names`.
    pub fn find_column(&self, names: &[String]) -> Option<usize> {
        self.headers.iter().position(|h| {
            let h = h.trim().to_lowercase();
            names.iter().any(|n| n.trim().to_lowercase() == h)
        })
    }

    /// Index of the first header containing any of `fragments` (case-insensitive).
    pub fn find_column_containing(&self, fragments: &[String]) -> Option<usize> {
        self.headers.iter().position(|h| {
            let h = h.to_lowercase();
            fragments.iter().any(|f| h.contains(&f.to_lowercase()))
        })
    }

    /// Cell at `row`, `col`, or empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Table of segmented line items.
    pub fn from_line_items(items: &[LineItem]) -> Self {
        let mut table = Self::new(LineItem::HEADERS.iter().map(|h| h.to_string()).collect());
        table.rows = items.iter().map(LineItem::to_row).collect();
        table
    }

    /// Table of normalized records: line item columns plus `normalized_category`.
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let mut headers: Vec<String> = LineItem::HEADERS.iter().map(|h| h.to_string()).collect();
        headers.push(NormalizedRecord::CATEGORY_COLUMN.to_string());

        let mut table = Self::new(headers);
        table.rows = records
            .iter()
            .map(|r| {
                let mut row = r.item.to_row();
                row.push(r.normalized_category.label().to_string());
                row
            })
            .collect();
        table
    }

    /// Append a column, filling each row from `values`.
    pub fn push_column(&mut self, header: &str, values: Vec<String>) {
        self.headers.push(header.to_string());
        let width = self.headers.len();
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width - 1, String::new());
            row.push(value);
        }
    }

    /// Replace the values of `header`, appending the column if it is missing.
    pub fn set_column(&mut self, header: &str, values: Vec<String>) {
        match self.headers.iter().position(|h| h == header) {
            Some(col) => {
                let width = self.headers.len();
                for (row, value) in self.rows.iter_mut().zip(values) {
                    if row.len() < width {
                        row.resize(width, String::new());
                    }
                    row[col] = value;
                }
            }
            None => self.push_column(header, values),
        }
    }

    /// Read a CSV file with a header row. Short rows are padded.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(|c| c.to_string()).collect();
            if row.len() < width {
                row.resize(width, String::new());
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as CSV, replacing `path` atomically.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_atomic(path, |file| {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerTable {
        LedgerTable {
            headers: vec!["Nr".into(), "Ráðuneyti".into(), "Fjárhæð".into()],
            rows: vec![
                vec!["01".into(), "Forsætisráðuneyti".into(), "1.200".into()],
                vec!["02".into(), "Menntamálaráðuneyti".into()],
            ],
        }
    }

    #[test]
    fn test_find_columns() {
        let table = sample();
        assert_eq!(table.find_column(&["ráðuneyti".to_string()]), Some(1));
        assert_eq!(table.find_column(&["ministry".to_string()]), None);
        assert_eq!(table.find_column_containing(&["fjár".to_string()]), Some(2));
    }

    #[test]
    fn test_push_column_pads_short_rows() {
        let mut table = sample();
        table.push_column("normalized_category", vec!["a".into(), "b".into()]);
        assert_eq!(table.rows[1], vec!["02", "Menntamálaráðuneyti", "", "b"]);
        assert_eq!(table.cell(1, 3), "b");
        assert_eq!(table.cell(9, 0), "");
    }

    #[test]
    fn test_set_column_replaces_existing() {
        let mut table = sample();
        table.set_column("Fjárhæð", vec!["1".into(), "2".into()]);
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.cell(1, 2), "2");

        table.set_column("source_file", vec!["a.csv".into(), "a.csv".into()]);
        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.cell(0, 3), "a.csv");
    }

    #[test]
    fn test_from_line_items() {
        let item = LineItem {
            ministry: Some("Fjármálaráðuneyti".into()),
            subcategory: None,
            line_text: "Laun 1.500".into(),
            amount: rust_decimal::Decimal::from(1500),
            year: Some(2009),
            source_document: "Rikisreikn2009.txt".into(),
        };
        let table = LedgerTable::from_line_items(&[item]);
        assert_eq!(
            table.headers,
            vec!["Ministry", "Subcategory", "LineItem", "Amount_thousands_ISK", "Year", "Source"]
        );
        assert_eq!(
            table.rows[0],
            vec!["Fjármálaráðuneyti", "", "Laun 1.500", "1500", "2009", "Rikisreikn2009.txt"]
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut table = sample();
        table.rows[1].push(String::new());
        table.write_csv(&path).unwrap();

        let loaded = LedgerTable::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }
}
