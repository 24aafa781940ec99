//! Query locations and the rounding that turns raw coordinates into join keys.

use polars::prelude::{col, DataType, Expr};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use ebird_weather::LatLon;
///
/// let almeria = LatLon(36.8, -2.5);
/// assert_eq!(almeria.0, 36.8); // Latitude
/// assert_eq!(almeria.1, -2.5); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// Number of decimal places coordinates are rounded to before they are used
/// as deduplication or join keys.
///
/// Both the coordinate deduplicator and the merger build their key columns
/// through [`Precision::key_exprs`], so a raw coordinate always lands on the
/// same key on both sides.
///
/// # Examples
///
/// ```
/// use ebird_weather::Precision;
///
/// let precision = Precision::default();
/// assert_eq!(precision.decimals(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision(u32);

impl Precision {
    pub fn new(decimals: u32) -> Self {
        Self(decimals)
    }

    pub fn decimals(&self) -> u32 {
        self.0
    }

    /// Rounded latitude/longitude expressions, aliased to the given output names.
    ///
    /// The source columns are cast to `Float64` first: a CSV column holding only
    /// whole degrees would otherwise be inferred as an integer column and fail to
    /// join against a float one.
    pub fn key_exprs(
        &self,
        lat_column: &str,
        lon_column: &str,
        lat_alias: &str,
        lon_alias: &str,
    ) -> [Expr; 2] {
        [
            col(lat_column)
                .cast(DataType::Float64)
                .round(self.0)
                .alias(lat_alias),
            col(lon_column)
                .cast(DataType::Float64)
                .round(self.0)
                .alias(lon_alias),
        ]
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_key_exprs_round_to_one_decimal() -> Result<(), PolarsError> {
        let df = df!(
            "LATITUDE" => [37.23, 36.87, -2.46],
            "LONGITUDE" => [-2.51, -2.34, 10.0],
        )?;

        let rounded = df
            .lazy()
            .select(Precision::default().key_exprs("LATITUDE", "LONGITUDE", "lat", "lon"))
            .collect()?;

        let lat: Vec<Option<f64>> = rounded.column("lat")?.f64()?.into_iter().collect();
        let lon: Vec<Option<f64>> = rounded.column("lon")?.f64()?.into_iter().collect();
        assert_eq!(lat, [Some(37.2), Some(36.9), Some(-2.5)]);
        assert_eq!(lon, [Some(-2.5), Some(-2.3), Some(10.0)]);
        Ok(())
    }

    #[test]
    fn test_key_exprs_cast_integer_columns() -> Result<(), PolarsError> {
        let df = df!(
            "latitude" => [37i64, -2],
            "longitude" => [1i64, 5],
        )?;

        let rounded = df
            .lazy()
            .select(Precision::new(2).key_exprs("latitude", "longitude", "latitude", "longitude"))
            .collect()?;

        assert_eq!(rounded.column("latitude")?.dtype(), &DataType::Float64);
        assert_eq!(rounded.column("longitude")?.f64()?.get(1), Some(5.0));
        Ok(())
    }
}
