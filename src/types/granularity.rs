//! Defines the time granularity of an archive query and the fixed, ordered
//! variable vocabulary requested for each granularity.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

const DAILY_VARIABLES: [&str; 7] = [
    "temperature_2m_mean",
    "relative_humidity_2m_mean",
    "cloud_cover_mean",
    "precipitation_sum",
    "rain_sum",
    "wind_gusts_10m_mean",
    "wind_speed_10m_mean",
];

const HOURLY_VARIABLES: [&str; 7] = [
    "temperature_2m",
    "relative_humidity_2m",
    "cloud_cover",
    "precipitation",
    "rain",
    "wind_gusts_10m",
    "wind_speed_10m",
];

/// Represents the granularity of the weather series requested from the archive.
///
/// The archive associates value arrays with the requested variables by
/// position, so [`Granularity::variables`] is an ordered list and must be sent
/// and read back in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Granularity {
    /// Daily aggregates (means and sums) per calendar day.
    #[default]
    Daily,
    /// Instantaneous values for every hour.
    Hourly,
}

impl Granularity {
    /// Name of the query parameter and of the response block carrying the series.
    pub fn block_name(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }

    /// The requested variables, in request order.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            Granularity::Daily => &DAILY_VARIABLES,
            Granularity::Hourly => &HOURLY_VARIABLES,
        }
    }

    /// Sampling interval of the series in seconds.
    pub fn interval_seconds(&self) -> i64 {
        match self {
            Granularity::Daily => 86_400,
            Granularity::Hourly => 3_600,
        }
    }

    /// Formats a sample timestamp for the `date` column of the weather table.
    ///
    /// Daily samples are written as plain calendar dates so they compare equal
    /// to the observation dates of the bird records.
    pub fn format_timestamp(&self, time: &DateTime<Utc>) -> String {
        match self {
            Granularity::Daily => time.format("%Y-%m-%d").to_string(),
            Granularity::Hourly => time.format("%Y-%m-%dT%H:%M").to_string(),
        }
    }
}

/// Allows formatting a `Granularity` variant using its `block_name`.
///
/// # Examples
///
/// ```
/// use ebird_weather::Granularity;
///
/// assert_eq!(Granularity::Hourly.to_string(), "hourly");
/// ```
impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.block_name())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "hourly" => Ok(Granularity::Hourly),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}
