use crate::tables::error::TableError;
use crate::weather_data::error::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read resume cursor '{0}'")]
    CursorRead(PathBuf, #[source] std::io::Error),

    #[error("Resume cursor '{path}' does not hold an index: {content:?}")]
    CursorParse { path: PathBuf, content: String },

    #[error("Failed to write resume cursor '{0}'")]
    CursorWrite(PathBuf, #[source] std::io::Error),

    #[error("Batch {start}-{end} failed")]
    Fetch {
        start: usize,
        end: usize,
        #[source]
        source: FetchError,
    },

    #[error("Batch {start}-{end} still failing after {attempts} attempts")]
    RetriesExhausted {
        start: usize,
        end: usize,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
