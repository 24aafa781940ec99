//! The append-only weather output table.

use crate::tables::error::TableError;
use crate::tables::io::scan_csv;
use crate::types::granularity::Granularity;
use crate::types::weather_row::WeatherRow;
use crate::utils::ensure_parent_dir;
use log::debug;
use polars::prelude::*;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A CSV file that weather rows are appended to, one batch at a time.
///
/// Columns are `date`, the requested variables in request order, `latitude`
/// and `longitude`. The header is written only when the file is created (or
/// found empty), so repeated runs and restarts never duplicate it.
#[derive(Debug, Clone)]
pub struct WeatherTable {
    path: PathBuf,
    granularity: Granularity,
}

impl WeatherTable {
    pub fn new(path: impl Into<PathBuf>, granularity: Granularity) -> Self {
        Self {
            path: path.into(),
            granularity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows` and syncs the file to disk before returning.
    ///
    /// Returns the number of rows written. Once this returns `Ok`, the rows are
    /// durable and the resume cursor may be advanced past them.
    pub fn append(&self, rows: &[WeatherRow]) -> Result<usize, TableError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut df = rows_to_frame(rows, self.granularity)?;

        let write_header = match fs::metadata(&self.path) {
            Ok(metadata) if metadata.len() == 0 => true,
            Ok(_) => {
                self.check_header(&df)?;
                false
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(TableError::Write(self.path.clone(), e)),
        };
        ensure_parent_dir(&self.path).map_err(|e| TableError::Write(self.path.clone(), e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TableError::Write(self.path.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_header(write_header)
            .finish(&mut df)
            .map_err(|e| TableError::Encode(self.path.clone(), e))?;
        file.sync_all()
            .map_err(|e| TableError::Write(self.path.clone(), e))?;

        debug!(
            "Appended {} rows to {} (header: {})",
            df.height(),
            self.path.display(),
            write_header
        );
        Ok(df.height())
    }

    /// Fails unless the existing first line names exactly the columns of `df`,
    /// so rows of another granularity never land under a foreign header.
    fn check_header(&self, df: &DataFrame) -> Result<(), TableError> {
        let file = File::open(&self.path).map_err(|e| TableError::Write(self.path.clone(), e))?;
        let mut found = String::new();
        BufReader::new(file)
            .read_line(&mut found)
            .map_err(|e| TableError::Write(self.path.clone(), e))?;
        let found = found.trim_end_matches(['\r', '\n']);

        let expected = df.get_column_names_str().join(",");
        if found != expected {
            return Err(TableError::HeaderMismatch {
                path: self.path.clone(),
                expected,
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Number of data rows written so far; zero if the table does not exist yet.
    pub fn row_count(&self) -> Result<usize, TableError> {
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.len() == 0 => return Ok(0),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(TableError::Write(self.path.clone(), e)),
        }
        let counted = scan_csv(&self.path)?
            .select([len().alias("rows")])
            .collect()
            .map_err(|e| TableError::Read(self.path.clone(), e))?;
        let rows = counted
            .column("rows")?
            .cast(&DataType::UInt64)?
            .u64()?
            .get(0)
            .unwrap_or(0);
        Ok(rows as usize)
    }
}

/// Lays out `rows` as the weather table's columns.
pub fn rows_to_frame(rows: &[WeatherRow], granularity: Granularity) -> Result<DataFrame, TableError> {
    let variables = granularity.variables();
    let mut columns = Vec::with_capacity(variables.len() + 3);

    let dates: Vec<String> = rows
        .iter()
        .map(|row| granularity.format_timestamp(&row.time))
        .collect();
    columns.push(Column::new("date".into(), dates));

    for (index, name) in variables.iter().enumerate() {
        let values: Vec<Option<f64>> = rows
            .iter()
            .map(|row| row.values.get(index).copied().flatten())
            .collect();
        columns.push(Column::new((*name).into(), values));
    }

    let latitudes: Vec<f64> = rows.iter().map(|row| row.location.0).collect();
    let longitudes: Vec<f64> = rows.iter().map(|row| row.location.1).collect();
    columns.push(Column::new("latitude".into(), latitudes));
    columns.push(Column::new("longitude".into(), longitudes));

    Ok(DataFrame::new(columns)?)
}
