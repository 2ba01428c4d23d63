//! Uploaded dataset: an in-memory CSV table
//!
//! The table is not validated against the prediction schema; any CSV with a
//! header row is accepted.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;

/// Rows shown in upload previews
pub const PREVIEW_ROWS: usize = 5;

/// Cell contents treated as missing
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null"];

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every non-missing cell parses as a number
    Numeric,
    Categorical,
}

/// Row-major table with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// First rows of a table, for display
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// Values of one column, typed
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Non-missing numbers
    Numeric(Vec<f64>),
    /// Non-missing labels, in row order
    Categorical(Vec<String>),
}

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

impl UploadedTable {
    /// Parse CSV text with a header row
    ///
    /// Rows must all have the header's width. Duplicate header names get a
    /// `.1`, `.2`, ... suffix so that every column stays addressable.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(Error::InvalidInput("no columns to parse from file".to_string()));
        }

        let columns = dedupe_columns(headers.iter());

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_csv_reader(bytes)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> TablePreview {
        TablePreview {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
            total_rows: self.rows.len(),
        }
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        let index = self.column_index(name)?;
        let numeric = self
            .rows
            .iter()
            .map(|row| row[index].as_str())
            .filter(|cell| !is_missing(cell))
            .all(|cell| parse_number(cell).is_some());

        Some(if numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        })
    }

    /// Non-missing values of a column, typed by [`ColumnKind`]
    pub fn column_values(&self, name: &str) -> Option<ColumnValues> {
        let index = self.column_index(name)?;
        let cells = self
            .rows
            .iter()
            .map(|row| row[index].as_str())
            .filter(|cell| !is_missing(cell));

        match self.column_kind(name)? {
            ColumnKind::Numeric => Some(ColumnValues::Numeric(
                cells.filter_map(parse_number).collect(),
            )),
            ColumnKind::Categorical => Some(ColumnValues::Categorical(
                cells.map(str::to_string).collect(),
            )),
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn dedupe_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(names.len());

    for name in &names {
        let mut candidate = name.to_string();
        while let Some(count) = seen.get(&candidate).copied() {
            seen.insert(candidate.clone(), count + 1);
            candidate = format!("{}.{}", name, count);
        }
        seen.insert(candidate.clone(), 1);
        columns.push(candidate);
    }

    columns
}
