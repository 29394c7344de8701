//! CSV loading and saving for customer tables

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Loads comma-separated customer tables into data frames
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned for type inference; `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader that infers column types from every row
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
        }
    }

    /// Limit type inference to the first `n` rows
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    /// Load a CSV file, failing with `MissingInputFile` when it is absent
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let file = File::open(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded csv"
        );
        Ok(df)
    }

    /// Parse CSV held in memory
    pub fn load_csv_bytes(&self, bytes: &[u8]) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;
        Ok(df)
    }
}

/// Serializes data frames back to CSV
pub struct DataSaver;

impl DataSaver {
    /// Encode a frame as CSV bytes
    pub fn to_csv_bytes(df: &mut DataFrame, include_header: bool) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(include_header)
            .finish(df)?;
        Ok(buffer)
    }
}
