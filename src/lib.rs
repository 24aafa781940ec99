mod batch;
mod config;
mod error;
mod pipeline;
mod tables;
mod types;
mod utils;
mod weather_data;

pub use config::{Cli, Commands, FetchArgs, ProgressArgs};
pub use error::PipelineError;
pub use pipeline::{FetchStatus, Pipeline};

pub use types::granularity::Granularity;
pub use types::lat_lon::{LatLon, Precision};
pub use types::observation_columns::ObservationColumns;
pub use types::weather_row::WeatherRow;

pub use weather_data::archive_client::{ArchiveClient, DEFAULT_ARCHIVE_URL};
pub use weather_data::error::{DataShapeError, FetchError};
pub use weather_data::reshape::reshape_block;
pub use weather_data::response::SeriesBlock;
pub use weather_data::source::{FetchRequest, WeatherSource};

pub use tables::coordinates::{deduplicate_coordinates, read_coordinates, write_coordinates};
pub use tables::error::TableError;
pub use tables::merge::{merge_observations, write_merged};
pub use tables::weather_table::{rows_to_frame, WeatherTable};

pub use batch::cursor::CursorStore;
pub use batch::error::BatchError;
pub use batch::retry::RetryPolicy;
pub use batch::runner::{BatchConfig, BatchRunner, RunSummary, RunnerState};
