//! The three stages of the pipeline bound to one set of files.

use crate::batch::cursor::CursorStore;
use crate::batch::runner::{BatchRunner, RunSummary};
use crate::error::PipelineError;
use crate::tables::coordinates::{deduplicate_coordinates, read_coordinates, write_coordinates};
use crate::tables::merge::{merge_observations, write_merged};
use crate::tables::weather_table::WeatherTable;
use crate::types::granularity::Granularity;
use crate::types::lat_lon::Precision;
use crate::types::observation_columns::ObservationColumns;
use crate::weather_data::source::WeatherSource;
use bon::bon;
use log::info;
use std::path::{Path, PathBuf};

/// Fetch progress as recorded on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStatus {
    pub coordinates: usize,
    pub cursor: usize,
    pub weather_rows: usize,
}

impl FetchStatus {
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.coordinates
    }
}

/// Owns the file locations and the region/rounding settings every stage shares.
///
/// The stages communicate only through files: [`Pipeline::extract_coordinates`]
/// writes the coordinate list, [`Pipeline::fetch_weather`] reads it and appends
/// to the weather table, and [`Pipeline::merge`] joins that table back onto the
/// observations. Each stage can run in its own process.
#[derive(Debug, Clone)]
pub struct Pipeline {
    observations: PathBuf,
    coordinates: PathBuf,
    weather: PathBuf,
    region: String,
    precision: Precision,
    columns: ObservationColumns,
}

#[bon]
impl Pipeline {
    /// # Examples
    ///
    /// ```
    /// use ebird_weather::Pipeline;
    /// use std::path::PathBuf;
    ///
    /// let pipeline = Pipeline::builder()
    ///     .observations(PathBuf::from("data/raw/ebird_spain_2020-2025.txt"))
    ///     .coordinates(PathBuf::from("data/processed/unique_coords.csv"))
    ///     .weather(PathBuf::from("data/processed/weather_andalucia_2025.csv"))
    ///     .region("Andalucía".to_string())
    ///     .build();
    /// assert_eq!(pipeline.region(), "Andalucía");
    /// ```
    #[builder]
    pub fn new(
        observations: PathBuf,
        coordinates: PathBuf,
        weather: PathBuf,
        region: String,
        precision: Option<Precision>,
        columns: Option<ObservationColumns>,
    ) -> Self {
        Self {
            observations,
            coordinates,
            weather,
            region,
            precision: precision.unwrap_or_default(),
            columns: columns.unwrap_or_default(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn weather_path(&self) -> &Path {
        &self.weather
    }

    /// Writes the region's unique rounded coordinates, returning how many there are.
    pub fn extract_coordinates(&self) -> Result<usize, PipelineError> {
        let mut unique = deduplicate_coordinates(
            &self.observations,
            &self.region,
            &self.columns,
            self.precision,
        )?;
        write_coordinates(&mut unique, &self.coordinates)?;
        Ok(unique.height())
    }

    /// Runs `runner` over the coordinate list from wherever `cursor` left off.
    pub async fn fetch_weather<S: WeatherSource>(
        &self,
        source: &S,
        runner: &BatchRunner,
        cursor: &CursorStore,
    ) -> Result<RunSummary, PipelineError> {
        let coordinates = read_coordinates(&self.coordinates)?;
        let table = WeatherTable::new(&self.weather, runner.config().granularity);
        Ok(runner.run(source, &coordinates, cursor, &table).await?)
    }

    /// Joins the observations with the weather table and writes the result to `output`.
    pub fn merge(&self, output: &Path) -> Result<usize, PipelineError> {
        let mut merged = merge_observations(
            &self.observations,
            &self.weather,
            &self.region,
            &self.columns,
            self.precision,
        )?;
        write_merged(&mut merged, output)?;
        Ok(merged.height())
    }

    /// Reads progress from the coordinate list, the cursor and the weather table.
    pub fn status(&self, cursor: &CursorStore) -> Result<FetchStatus, PipelineError> {
        let status = FetchStatus {
            coordinates: read_coordinates(&self.coordinates)?.len(),
            cursor: cursor.load()?,
            weather_rows: WeatherTable::new(&self.weather, Granularity::default()).row_count()?,
        };
        info!(
            "{} of {} coordinates fetched, {} weather rows",
            status.cursor.min(status.coordinates),
            status.coordinates,
            status.weather_rows
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::retry::RetryPolicy;
    use crate::batch::runner::BatchConfig;
    use crate::types::weather_row::WeatherRow;
    use crate::weather_data::error::FetchError;
    use crate::weather_data::source::FetchRequest;
    use chrono::{Duration as DateDuration, NaiveDate};
    use std::error::Error;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    const OBSERVATIONS: &str = "\
COMMON NAME\tSCIENTIFIC NAME\tSTATE\tLATITUDE\tLONGITUDE\tOBSERVATION DATE
Greater Flamingo\tPhoenicopterus roseus\tAndalucía\t36.8412\t-2.4633\t2025-01-02
Audouin's Gull\tIchthyaetus audouinii\tAndalucía\t36.83\t-2.47\t2025-01-01
Bonelli's Eagle\tAquila fasciata\tAndalucía\t37.18\t-3.6\t2025-01-03
Little Bustard\tTetrax tetrax\tCataluña\t41.6\t0.6\t2025-01-01
";

    /// One row per day of the window, temperature set to the latitude.
    struct DailySource;

    impl WeatherSource for DailySource {
        async fn fetch(&self, request: &FetchRequest) -> Result<Vec<WeatherRow>, FetchError> {
            let days = (request.end() - request.start()).num_days() + 1;
            Ok(request
                .locations()
                .iter()
                .flat_map(|&location| {
                    (0..days).map(move |offset| {
                        let day = request.start() + DateDuration::days(offset);
                        WeatherRow {
                            time: day.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                            location,
                            values: vec![Some(location.0), Some(70.0), None, Some(0.0), Some(0.0), None, Some(3.0)],
                        }
                    })
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_stages_through_files() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let observations = dir.path().join("observations.txt");
        fs::write(&observations, OBSERVATIONS)?;
        let pipeline = Pipeline::builder()
            .observations(observations)
            .coordinates(dir.path().join("unique_coords.csv"))
            .weather(dir.path().join("weather.csv"))
            .region("Andalucía".to_string())
            .build();
        let cursor = CursorStore::new(dir.path().join("fetch_progress.txt"));

        assert_eq!(pipeline.extract_coordinates()?, 2);

        let runner = BatchRunner::new(
            BatchConfig::builder()
                .start_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
                .end_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
                .batch_size(1)
                .batch_delay(Duration::ZERO)
                .retry(RetryPolicy::unbounded(Duration::ZERO))
                .build(),
        )?;
        let summary = pipeline.fetch_weather(&DailySource, &runner, &cursor).await?;
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.rows_written, 4);

        let status = pipeline.status(&cursor)?;
        assert!(status.is_complete());
        assert_eq!(status.weather_rows, 4);

        let output = dir.path().join("merged.csv");
        assert_eq!(pipeline.merge(&output)?, 2);
        let merged = fs::read_to_string(&output)?;
        assert!(merged.contains("Greater Flamingo"));
        assert!(merged.contains("Audouin's Gull"));
        assert!(!merged.contains("Bonelli's Eagle"));
        Ok(())
    }

    #[test]
    fn test_status_before_fetch() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let coordinates = dir.path().join("unique_coords.csv");
        fs::write(&coordinates, "lat,lon\n36.8,-2.5\n37.2,-3.6\n")?;
        let pipeline = Pipeline::builder()
            .observations(dir.path().join("observations.txt"))
            .coordinates(coordinates)
            .weather(dir.path().join("weather.csv"))
            .region("Andalucía".to_string())
            .build();

        let status = pipeline.status(&CursorStore::new(dir.path().join("fetch_progress.txt")))?;
        assert_eq!(
            status,
            FetchStatus {
                coordinates: 2,
                cursor: 0,
                weather_rows: 0
            }
        );
        assert!(!status.is_complete());
        Ok(())
    }
}
