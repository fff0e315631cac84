//! Sheet Loader Module
//! Fetches the published sheet and parses it into an untyped table using Polars.

use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Untyped table as fetched: a header row plus string cells (`None` = empty).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table, padding or truncating every row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse CSV bytes. Every column is read as text; typing happens later.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, LoaderError> {
        let text = decode_text(bytes);
        if text.trim().is_empty() {
            return Err(LoaderError::NoData);
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()?;

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(headers.len()); df.height()];
        for column in df.get_columns() {
            let series = column.as_materialized_series().cast(&DataType::String)?;
            let values = series.str()?;
            for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                row.push(value.map(|s| s.to_string()));
            }
        }

        debug!(columns = headers.len(), rows = rows.len(), "parsed csv");
        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Get the number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Index of a header matching `name` after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell text, `None` when empty or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// True when every cell of the row is empty or whitespace.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows.get(row).map_or(true, |cells| {
            cells
                .iter()
                .all(|c| c.as_deref().map_or(true, |s| s.trim().is_empty()))
        })
    }
}

/// Decode sheet bytes as UTF-8 (BOM stripped), falling back to Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Rewrite a Google Sheets edit link into its CSV export link.
///
/// Links that are already export/publish links, or not Google Sheets at all,
/// are returned unchanged.
pub fn export_url(url: &str) -> String {
    let trimmed = url.trim();
    if !trimmed.contains("docs.google.com/spreadsheets/d/") {
        return trimmed.to_string();
    }
    match trimmed.find("/edit") {
        Some(pos) => format!("{}/export?format=csv", &trimmed[..pos]),
        None => trimmed.to_string(),
    }
}

/// Where raw sheet bytes come from.
pub trait SheetSource: Send + Sync {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, LoaderError>;
}

/// Fetches sheets over HTTP(S).
pub struct HttpSheetSource {
    client: reqwest::blocking::Client,
}

impl HttpSheetSource {
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("salgsdashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl SheetSource for HttpSheetSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, LoaderError> {
        let url = export_url(location);
        info!(%url, "fetching sheet");
        let response = self.client.get(&url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        debug!(bytes = bytes.len(), "sheet downloaded");
        Ok(bytes.to_vec())
    }
}

/// Reads sheets from the local filesystem (plain path or `file://` URL).
pub struct FileSheetSource;

impl SheetSource for FileSheetSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, LoaderError> {
        let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
        info!(path = %path.display(), "reading sheet");
        std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Pick a source for a configured location.
pub fn source_for(location: &str, timeout: Duration) -> Result<Box<dyn SheetSource>, LoaderError> {
    let lower = location.trim().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(Box::new(HttpSheetSource::new(timeout)?))
    } else {
        Ok(Box::new(FileSheetSource))
    }
}
