use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Input file '{0}' not found")]
    InputNotFound(PathBuf),

    #[error("Failed to read table '{0}'")]
    Read(PathBuf, #[source] PolarsError),

    #[error("I/O error writing table '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing table '{0}'")]
    Encode(PathBuf, #[source] PolarsError),

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Row {row} of '{path}' has no usable coordinate")]
    InvalidCoordinate { path: PathBuf, row: usize },

    #[error("Table '{path}' has header {found:?}, expected {expected:?}")]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
