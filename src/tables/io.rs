//! Reading and writing the flat files the pipeline exchanges.

use crate::tables::error::TableError;
use crate::utils::ensure_parent_dir;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

const INFER_SCHEMA_ROWS: usize = 10_000;

/// Lazily scans the tab-delimited observation export.
///
/// Quoting is disabled and ragged lines are truncated: free-text columns of
/// eBird exports contain unbalanced quotes and trailing tabs.
pub fn scan_observations(path: &Path) -> Result<LazyFrame, TableError> {
    if !path.exists() {
        return Err(TableError::InputNotFound(path.to_path_buf()));
    }
    LazyCsvReader::new(path)
        .with_separator(b'\t')
        .with_quote_char(None)
        .with_has_header(true)
        .with_truncate_ragged_lines(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .finish()
        .map_err(|e| TableError::Read(path.to_path_buf(), e))
}

/// Lazily scans a comma-separated table written by this crate.
pub fn scan_csv(path: &Path) -> Result<LazyFrame, TableError> {
    if !path.exists() {
        return Err(TableError::InputNotFound(path.to_path_buf()));
    }
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .finish()
        .map_err(|e| TableError::Read(path.to_path_buf(), e))
}

/// Fails with [`TableError::MissingColumn`] for the first of `columns` absent from `frame`.
pub fn require_columns(
    frame: &mut LazyFrame,
    path: &Path,
    columns: &[&str],
) -> Result<(), TableError> {
    let schema = frame
        .collect_schema()
        .map_err(|e| TableError::Read(path.to_path_buf(), e))?;
    match columns.iter().find(|name| !schema.contains(name)) {
        Some(missing) => Err(TableError::MissingColumn {
            path: path.to_path_buf(),
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}

/// Writes `df` to `path` as CSV with a header, replacing any existing file.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    ensure_parent_dir(path).map_err(|e| TableError::Write(path.to_path_buf(), e))?;
    let mut file = File::create(path).map_err(|e| TableError::Write(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| TableError::Encode(path.to_path_buf(), e))
}
