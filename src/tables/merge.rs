//! Joins bird observations with the weather recorded at the same place and day.

use crate::tables::error::TableError;
use crate::tables::io::{require_columns, scan_csv, scan_observations, write_frame};
use crate::types::lat_lon::Precision;
use crate::types::observation_columns::ObservationColumns;
use log::info;
use polars::prelude::*;
use std::path::Path;

const LAT_KEY: &str = "lat_rounded";
const LON_KEY: &str = "lon_rounded";

/// Inner-joins the observations of `region` with the weather table on
/// `(date, rounded latitude, rounded longitude)`.
///
/// Both sides are rounded with the same `precision` used to build the
/// coordinate list. Dates are compared as strings: the weather `date` column
/// must use the observation export's `YYYY-MM-DD` format, which daily weather
/// tables do. Observations without weather and weather without observations
/// are dropped.
///
/// The result carries every observation column, `date`, the two rounded key
/// columns and every weather variable.
pub fn merge_observations(
    observations: &Path,
    weather: &Path,
    region: &str,
    columns: &ObservationColumns,
    precision: Precision,
) -> Result<DataFrame, TableError> {
    let mut birds = scan_observations(observations)?;
    require_columns(&mut birds, observations, &columns.all())?;
    let mut weather_frame = scan_csv(weather)?;
    require_columns(&mut weather_frame, weather, &["date", "latitude", "longitude"])?;

    let [lat_key, lon_key] =
        precision.key_exprs(&columns.latitude, &columns.longitude, LAT_KEY, LON_KEY);
    let birds = birds
        .select(columns.all().map(col))
        .filter(col(columns.region.as_str()).eq(lit(region)))
        .with_columns([
            col(columns.date.as_str()).cast(DataType::String).alias("date"),
            lat_key,
            lon_key,
        ]);

    let [weather_lat, weather_lon] =
        precision.key_exprs("latitude", "longitude", "latitude", "longitude");
    let weather_frame = weather_frame.with_columns([
        col("date").cast(DataType::String),
        weather_lat,
        weather_lon,
    ]);

    let merged = birds
        .join(
            weather_frame,
            [col("date"), col(LAT_KEY), col(LON_KEY)],
            [col("date"), col("latitude"), col("longitude")],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;
    info!("Matched {} observations with weather", merged.height());
    Ok(merged)
}

/// Writes the merged dataset as CSV.
pub fn write_merged(merged: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    write_frame(merged, path)?;
    info!("Saved {} merged rows to {}", merged.height(), path.display());
    Ok(())
}
