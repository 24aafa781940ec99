//! Reduces the observation export to the unique, rounded coordinates of one region.

use crate::tables::error::TableError;
use crate::tables::io::{require_columns, scan_observations, write_frame};
use crate::types::lat_lon::{LatLon, Precision};
use crate::types::observation_columns::ObservationColumns;
use log::info;
use polars::prelude::*;
use std::path::Path;

/// Collects the unique `(lat, lon)` pairs observed in `region`.
///
/// Coordinates are rounded with `precision` before deduplication. Pairs keep
/// the order of their first appearance, so rerunning on the same export yields
/// the same list and a persisted resume cursor stays meaningful.
///
/// # Errors
///
/// Returns [`TableError::InputNotFound`] if the export does not exist and
/// [`TableError::MissingColumn`] if the region or coordinate columns are absent.
pub fn deduplicate_coordinates(
    observations: &Path,
    region: &str,
    columns: &ObservationColumns,
    precision: Precision,
) -> Result<DataFrame, TableError> {
    info!("Loading observations from {}", observations.display());
    let mut frame = scan_observations(observations)?;
    require_columns(
        &mut frame,
        observations,
        &[
            columns.region.as_str(),
            columns.latitude.as_str(),
            columns.longitude.as_str(),
        ],
    )?;

    let rounded = frame
        .filter(col(columns.region.as_str()).eq(lit(region)))
        .select(precision.key_exprs(&columns.latitude, &columns.longitude, "lat", "lon"))
        .filter(col("lat").is_not_null().and(col("lon").is_not_null()))
        .collect()?;
    info!("Filtered to {} {} rows", rounded.height(), region);

    let unique = rounded
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    info!("Found {} unique coordinates", unique.height());
    Ok(unique)
}

/// Writes the coordinate list as a CSV with columns `lat`, `lon`.
pub fn write_coordinates(coordinates: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    write_frame(coordinates, path)?;
    info!(
        "Saved {} unique coordinates to {}",
        coordinates.height(),
        path.display()
    );
    Ok(())
}

/// Reads a coordinate list written by [`write_coordinates`], preserving row order.
pub fn read_coordinates(path: &Path) -> Result<Vec<LatLon>, TableError> {
    if !path.exists() {
        return Err(TableError::InputNotFound(path.to_path_buf()));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| TableError::Read(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| TableError::Read(path.to_path_buf(), e))?;

    let latitudes = coordinate_values(&df, path, "lat")?;
    let longitudes = coordinate_values(&df, path, "lon")?;

    latitudes
        .into_iter()
        .zip(longitudes)
        .enumerate()
        .map(|(row, pair)| match pair {
            (Some(lat), Some(lon)) => Ok(LatLon(lat, lon)),
            _ => Err(TableError::InvalidCoordinate {
                path: path.to_path_buf(),
                row,
            }),
        })
        .collect()
}

fn coordinate_values(
    df: &DataFrame,
    path: &Path,
    name: &str,
) -> Result<Vec<Option<f64>>, TableError> {
    let column = df.column(name).map_err(|_| TableError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })?;
    let column = column.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs;
    use tempfile::tempdir;

    const OBSERVATIONS: &str = "\
COMMON NAME\tSCIENTIFIC NAME\tOBSERVATION DATE\tLATITUDE\tLONGITUDE\tSTATE
Hoopoe\tUpupa epops\t2025-01-01\t37.23\t-2.51\tAndalucía
Hoopoe\tUpupa epops\t2025-01-02\t37.18\t-2.49\tAndalucía
Bee-eater\tMerops apiaster\t2025-01-01\t36.84\t-2.33\tAndalucía
Azure-winged Magpie\tCyanopica cooki\t2025-01-01\t40.41\t-3.70\tMadrid
Crested Lark\tGalerida cristata\t2025-01-03\t37.21\t-2.54\tAndalucía
";

    fn andalucia(source: &Path) -> Result<DataFrame, TableError> {
        deduplicate_coordinates(
            source,
            "Andalucía",
            &ObservationColumns::default(),
            Precision::default(),
        )
    }

    #[test]
    fn test_deduplicate_filters_region_and_rounds() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("ebird.txt");
        fs::write(&source, OBSERVATIONS)?;

        let coords = andalucia(&source)?;

        assert_eq!(coords.get_column_names_str(), ["lat", "lon"]);
        let lat: Vec<Option<f64>> = coords.column("lat")?.f64()?.into_iter().collect();
        let lon: Vec<Option<f64>> = coords.column("lon")?.f64()?.into_iter().collect();
        assert_eq!(lat, [Some(37.2), Some(36.8)]);
        assert_eq!(lon, [Some(-2.5), Some(-2.3)]);
        Ok(())
    }

    #[test]
    fn test_write_then_read_keeps_order() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("ebird.txt");
        fs::write(&source, OBSERVATIONS)?;
        let target = dir.path().join("processed").join("unique_coords.csv");

        let mut coords = andalucia(&source)?;
        write_coordinates(&mut coords, &target)?;

        assert!(fs::read_to_string(&target)?.starts_with("lat,lon\n"));
        assert_eq!(
            read_coordinates(&target)?,
            [LatLon(37.2, -2.5), LatLon(36.8, -2.3)]
        );
        Ok(())
    }

    #[test]
    fn test_missing_input_is_reported() {
        assert!(matches!(
            andalucia(Path::new("/nonexistent/ebird.txt")),
            Err(TableError::InputNotFound(_))
        ));
        assert!(matches!(
            read_coordinates(Path::new("/nonexistent/unique_coords.csv")),
            Err(TableError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_missing_column_is_reported() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("ebird.txt");
        fs::write(&source, "LATITUDE\tLONGITUDE\n37.2\t-2.5\n")?;

        let result = andalucia(&source);
        assert!(
            matches!(result, Err(TableError::MissingColumn { ref column, .. }) if column == "STATE")
        );
        Ok(())
    }

    #[test]
    fn test_null_coordinate_rejected() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("unique_coords.csv");
        fs::write(&path, "lat,lon\n37.2,-2.5\n36.8,\n")?;

        assert!(matches!(
            read_coordinates(&path),
            Err(TableError::InvalidCoordinate { row: 1, .. })
        ));
        Ok(())
    }
}
