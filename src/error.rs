use crate::batch::error::BatchError;
use crate::tables::error::TableError;
use crate::weather_data::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
