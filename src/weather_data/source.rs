//! The request type of the fetch client and the seam the batch runner drives.

use crate::types::granularity::Granularity;
use crate::types::lat_lon::LatLon;
use crate::types::weather_row::WeatherRow;
use crate::weather_data::error::FetchError;
use chrono::NaiveDate;
use std::future::Future;

/// One logical archive query: every location over the same inclusive date window.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    start: NaiveDate,
    end: NaiveDate,
    locations: Vec<LatLon>,
    granularity: Granularity,
}

impl FetchRequest {
    /// Builds a request from parallel latitude/longitude lists, position `i` in
    /// both lists defining one location.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if the lists differ in length.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        latitudes: &[f64],
        longitudes: &[f64],
        granularity: Granularity,
    ) -> Result<Self, FetchError> {
        if latitudes.len() != longitudes.len() {
            return Err(FetchError::InvalidRequest(format!(
                "{} latitudes but {} longitudes",
                latitudes.len(),
                longitudes.len()
            )));
        }
        let locations = latitudes
            .iter()
            .zip(longitudes)
            .map(|(&lat, &lon)| LatLon(lat, lon))
            .collect();
        Self::from_locations(start, end, locations, granularity)
    }

    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] for an empty location list or a
    /// window whose start lies after its end.
    pub fn from_locations(
        start: NaiveDate,
        end: NaiveDate,
        locations: Vec<LatLon>,
        granularity: Granularity,
    ) -> Result<Self, FetchError> {
        if locations.is_empty() {
            return Err(FetchError::InvalidRequest("no locations".to_string()));
        }
        if start > end {
            return Err(FetchError::InvalidRequest(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            locations,
            granularity,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn locations(&self) -> &[LatLon] {
        &self.locations
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

/// Anything that can answer a [`FetchRequest`] with flat weather rows.
///
/// Implementations must not retry on their own; retry policy belongs to the caller.
pub trait WeatherSource {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<Vec<WeatherRow>, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parallel_lists_pair_by_position() -> Result<(), FetchError> {
        let request = FetchRequest::new(
            date(2020, 1, 1),
            date(2020, 1, 10),
            &[37.2, 36.8],
            &[-2.5, -2.3],
            Granularity::Daily,
        )?;
        assert_eq!(request.locations(), [LatLon(37.2, -2.5), LatLon(36.8, -2.3)]);
        Ok(())
    }

    #[test]
    fn test_rejects_unequal_lists() {
        let result = FetchRequest::new(
            date(2020, 1, 1),
            date(2020, 1, 10),
            &[37.2, 36.8],
            &[-2.5],
            Granularity::Daily,
        );
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn test_rejects_inverted_window_and_empty_batch() {
        let inverted = FetchRequest::from_locations(
            date(2020, 2, 1),
            date(2020, 1, 1),
            vec![LatLon(37.2, -2.5)],
            Granularity::Daily,
        );
        assert!(matches!(inverted, Err(FetchError::InvalidRequest(_))));

        let empty = FetchRequest::from_locations(
            date(2020, 1, 1),
            date(2020, 1, 1),
            vec![],
            Granularity::Hourly,
        );
        assert!(matches!(empty, Err(FetchError::InvalidRequest(_))));
    }
}
