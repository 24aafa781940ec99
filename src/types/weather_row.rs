use crate::types::lat_lon::LatLon;
use chrono::{DateTime, Utc};

/// One sample of one location: the values of every requested variable at `time`.
///
/// `values` is aligned with [`crate::Granularity::variables`]; a sample the
/// archive reported as `null` is `None`.
#[derive(Debug, PartialEq, Clone)]
pub struct WeatherRow {
    pub time: DateTime<Utc>,
    pub location: LatLon, // as requested, not as snapped by the archive grid
    pub values: Vec<Option<f64>>,
}
