//! Wire format of the archive service and its normalised time-series form.

use crate::types::granularity::Granularity;
use crate::weather_data::error::DataShapeError;
use serde::Deserialize;
use std::collections::HashMap;

/// A multi-location query answers with an array; a single location with a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ArchiveBody {
    Many(Vec<LocationResponse>),
    One(LocationResponse),
}

impl ArchiveBody {
    pub(crate) fn into_locations(self) -> Vec<LocationResponse> {
        match self {
            ArchiveBody::Many(locations) => locations,
            ArchiveBody::One(location) => vec![location],
        }
    }
}

/// Body of a rejected request, e.g. `{"error": true, "reason": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub daily: Option<RawSeries>,
    #[serde(default)]
    pub hourly: Option<RawSeries>,
}

impl LocationResponse {
    pub(crate) fn into_block(self, granularity: Granularity) -> Result<SeriesBlock, DataShapeError> {
        let raw = match granularity {
            Granularity::Daily => self.daily,
            Granularity::Hourly => self.hourly,
        }
        .ok_or(DataShapeError::MissingBlock(granularity))?;
        SeriesBlock::from_raw(raw, granularity)
    }
}

/// A `daily`/`hourly` block as sent: unix timestamps plus one array per variable.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSeries {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub variables: HashMap<String, Vec<Option<f64>>>,
}

/// One location's time series: the half-open axis `[start, end)` stepped by
/// `interval` seconds, and one value array per requested variable, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBlock {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
    pub values: Vec<Vec<Option<f64>>>,
}

impl SeriesBlock {
    fn from_raw(mut raw: RawSeries, granularity: Granularity) -> Result<Self, DataShapeError> {
        let interval = granularity.interval_seconds();
        let start = raw.time.first().copied().unwrap_or(0);
        let end = match raw.time.last() {
            Some(&last) => last
                .checked_add(interval)
                .ok_or(DataShapeError::InvalidTimestamp(last))?,
            None => start,
        };

        for (index, &found) in raw.time.iter().enumerate() {
            let expected = i64::try_from(index)
                .ok()
                .and_then(|index| index.checked_mul(interval))
                .and_then(|offset| offset.checked_add(start))
                .ok_or(DataShapeError::InvalidTimestamp(found))?;
            if found != expected {
                return Err(DataShapeError::IrregularTime {
                    index,
                    expected,
                    found,
                });
            }
        }

        let values = granularity
            .variables()
            .iter()
            .map(|name| {
                raw.variables
                    .remove(*name)
                    .ok_or_else(|| DataShapeError::MissingVariable(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            start,
            end,
            interval,
            values,
        })
    }
}
