//! Data Processor Module
//! Normalizes a raw sheet into a week-indexed numeric table.

use super::coerce::parse_number;
use super::loader::RawTable;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Missing key column '{label}' (found: {})", .available.join(", "))]
    MissingKeyColumn {
        label: String,
        available: Vec<String>,
    },
    #[error("Row on line {line} has no value in key column '{column}'")]
    UnresolvedKey { line: usize, column: String },
}

/// Row identifier: a week number, or a free-text label when not an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekKey {
    Number(i64),
    Label(String),
}

impl WeekKey {
    /// Parse a key cell. Blank cells have no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(n) = text.parse::<i64>() {
            return Some(WeekKey::Number(n));
        }
        // Sheets sometimes export whole numbers as "3.0"
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return Some(WeekKey::Number(f as i64));
            }
        }
        Some(WeekKey::Label(text.to_string()))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekKey::Number(n) => write!(f, "{}", n),
            WeekKey::Label(s) => f.write_str(s),
        }
    }
}

/// A named column of numeric-or-missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NumericColumn {
    /// Non-missing values paired with their row position, in row order.
    pub fn present(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }
}

/// Table keyed by a unique week identifier, one numeric column per source column.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekIndexedTable {
    key_column: String,
    keys: Vec<WeekKey>,
    index: HashMap<WeekKey, usize>,
    columns: Vec<NumericColumn>,
}

impl WeekIndexedTable {
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Keys in row order.
    pub fn keys(&self) -> &[WeekKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[NumericColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&NumericColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row position of a key.
    pub fn position(&self, key: &WeekKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Value at (`key`, `column`); `None` when the key, column or value is missing.
    pub fn value(&self, column: &str, key: &WeekKey) -> Option<f64> {
        let row = self.position(key)?;
        self.column(column)?.values.get(row).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Find the key column: exact (trimmed) header first, then case-insensitive.
pub fn find_key_column(raw: &RawTable, label: &str) -> Option<usize> {
    let wanted = label.trim();
    raw.column_index(wanted).or_else(|| {
        let lower = wanted.to_lowercase();
        raw.headers()
            .iter()
            .position(|h| h.trim().to_lowercase() == lower)
    })
}

/// Normalize a raw sheet into a week-indexed table.
///
/// Entirely blank rows are skipped. Duplicate keys keep the position of their
/// first occurrence and the values of their last. Unparseable cells become
/// missing.
pub fn normalize(raw: &RawTable, key_label: &str) -> Result<WeekIndexedTable, NormalizeError> {
    let key_idx = find_key_column(raw, key_label).ok_or_else(|| NormalizeError::MissingKeyColumn {
        label: key_label.to_string(),
        available: raw.headers().to_vec(),
    })?;
    let key_column = raw.headers()[key_idx].trim().to_string();

    let value_cols: Vec<usize> = (0..raw.headers().len()).filter(|&i| i != key_idx).collect();
    let mut columns: Vec<NumericColumn> = value_cols
        .iter()
        .map(|&i| NumericColumn {
            name: raw.headers()[i].trim().to_string(),
            values: Vec::new(),
        })
        .collect();

    let mut keys: Vec<WeekKey> = Vec::new();
    let mut index: HashMap<WeekKey, usize> = HashMap::new();

    for row in 0..raw.height() {
        if raw.is_blank_row(row) {
            continue;
        }

        let key = raw
            .cell(row, key_idx)
            .and_then(WeekKey::parse)
            .ok_or_else(|| NormalizeError::UnresolvedKey {
                // header is line 1
                line: row + 2,
                column: key_column.clone(),
            })?;

        let values = value_cols
            .iter()
            .map(|&col| raw.cell(row, col).and_then(parse_number));

        match index.get(&key).copied() {
            Some(pos) => {
                warn!(week = %key, line = row + 2, "duplicate week, keeping last values");
                for (column, value) in columns.iter_mut().zip(values) {
                    column.values[pos] = value;
                }
            }
            None => {
                index.insert(key.clone(), keys.len());
                keys.push(key);
                for (column, value) in columns.iter_mut().zip(values) {
                    column.values.push(value);
                }
            }
        }
    }

    debug!(
        key = %key_column,
        rows = keys.len(),
        columns = columns.len(),
        "normalized sheet"
    );

    Ok(WeekIndexedTable {
        key_column,
        keys,
        index,
        columns,
    })
}

/// Compare digit-only strings numerically without overflowing.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.cmp(b))
}

/// Columns whose names are purely decimal digits, in ascending numeric order.
///
/// This is a heuristic: any digit-only header counts as a year.
pub fn select_year_columns(table: &WeekIndexedTable) -> Vec<String> {
    let mut years: Vec<String> = table
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .collect();
    years.sort_by(|a, b| cmp_digits(a, b));
    years
}
