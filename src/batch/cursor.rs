//! Persisted index of the next coordinate to fetch.

use crate::batch::error::BatchError;
use crate::utils::ensure_parent_dir;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A single ASCII integer in a file, overwritten after every batch.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cursor, `0` when nothing has been persisted yet.
    pub fn load(&self) -> Result<usize, BatchError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(BatchError::CursorRead(self.path.clone(), e)),
        };
        content
            .trim()
            .parse::<usize>()
            .map_err(|_| BatchError::CursorParse {
                path: self.path.clone(),
                content,
            })
    }

    /// Replaces the persisted cursor with `index`.
    ///
    /// The value is written to a temporary file next to the cursor and renamed
    /// over it, so an interrupted save leaves the previous value in place.
    pub fn save(&self, index: usize) -> Result<(), BatchError> {
        let write_err = |e: io::Error| BatchError::CursorWrite(self.path.clone(), e);

        ensure_parent_dir(&self.path).map_err(write_err)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp_file
            .write_all(index.to_string().as_bytes())
            .map_err(write_err)?;
        temp_file.as_file().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|e| write_err(e.error))?;

        debug!("Saved resume cursor {} to {}", index, self.path.display());
        Ok(())
    }
}
