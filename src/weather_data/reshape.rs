//! Turns per-location time series into flat weather rows.

use crate::types::granularity::Granularity;
use crate::types::lat_lon::LatLon;
use crate::types::weather_row::WeatherRow;
use crate::weather_data::error::DataShapeError;
use crate::weather_data::response::{ArchiveBody, SeriesBlock};
use crate::weather_data::source::FetchRequest;
use chrono::DateTime;
use log::debug;

/// Reconstructs one row per timestamp of `block`, stamped with `location`.
///
/// Timestamps are generated as the half-open sequence `[start, end)` stepped by
/// `interval`. Every value array must have exactly one entry per timestamp.
///
/// # Errors
///
/// Returns a [`DataShapeError`] if the interval is not positive, the number of
/// value arrays differs from the number of requested variables, or any array
/// length differs from the number of generated timestamps. No rows are
/// produced in that case.
pub fn reshape_block(
    block: &SeriesBlock,
    location: LatLon,
    granularity: Granularity,
) -> Result<Vec<WeatherRow>, DataShapeError> {
    if block.interval <= 0 {
        return Err(DataShapeError::InvalidInterval(block.interval));
    }
    let variables = granularity.variables();
    if block.values.len() != variables.len() {
        return Err(DataShapeError::VariableCount {
            expected: variables.len(),
            found: block.values.len(),
        });
    }

    let timestamps: Vec<i64> = (block.start..block.end)
        .step_by(block.interval as usize)
        .collect();

    for (name, series) in variables.iter().zip(&block.values) {
        if series.len() != timestamps.len() {
            return Err(DataShapeError::LengthMismatch {
                variable: name.to_string(),
                expected: timestamps.len(),
                found: series.len(),
            });
        }
    }

    timestamps
        .iter()
        .enumerate()
        .map(|(index, &timestamp)| {
            let time = DateTime::from_timestamp(timestamp, 0)
                .ok_or(DataShapeError::InvalidTimestamp(timestamp))?;
            Ok(WeatherRow {
                time,
                location,
                values: block.values.iter().map(|series| series[index]).collect(),
            })
        })
        .collect()
}

/// Decodes a full archive body and flattens it, location order first, then time.
pub(crate) fn reshape_body(
    body: &str,
    url: &str,
    request: &FetchRequest,
) -> Result<Vec<WeatherRow>, DataShapeError> {
    let parsed: ArchiveBody =
        serde_json::from_str(body).map_err(|e| DataShapeError::InvalidBody {
            url: url.to_string(),
            source: e,
        })?;
    let locations = parsed.into_locations();

    if locations.len() != request.locations().len() {
        return Err(DataShapeError::LocationCount {
            expected: request.locations().len(),
            found: locations.len(),
        });
    }

    let mut rows = Vec::new();
    for (response, &requested) in locations.into_iter().zip(request.locations()) {
        debug!(
            "Coordinates {}°N {}°E (requested {}, {}), elevation {:?} m asl, UTC offset {}s",
            response.latitude,
            response.longitude,
            requested.0,
            requested.1,
            response.elevation,
            response.utc_offset_seconds
        );
        let block = response.into_block(request.granularity())?;
        rows.extend(reshape_block(&block, requested, request.granularity())?);
    }
    Ok(rows)
}
