// sieve-core/src/infrastructure/adapters/csv.rs

use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::domain::dataset::{DataType, Record, Schema, Value};
use crate::domain::project::SourceConfig;
use crate::error::SieveError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::{SourceBatch, SourceReader};

/// Reads a headed CSV file, typing each cell by its declared column.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    schema: Schema,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            schema,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Relative source paths are resolved against the project directory.
    pub fn from_config(project_dir: &Path, source: &SourceConfig) -> Result<Self, SieveError> {
        let delimiter = u8::try_from(source.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                InfrastructureError::ConfigError(format!(
                    "CSV delimiter must be a single ASCII character, got {:?}",
                    source.delimiter
                ))
            })?;
        let raw_path = Path::new(&source.path);
        let path = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            project_dir.join(raw_path)
        };
        Ok(Self::new(path, source.schema()?).with_delimiter(delimiter))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceReader for CsvSource {
    #[instrument(skip(self), fields(path = ?self.path))]
    fn read(&self) -> Result<SourceBatch, SieveError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(::csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(InfrastructureError::from)?;

        let headers = reader.headers().map_err(InfrastructureError::from)?.clone();
        let types: Vec<Option<DataType>> = headers
            .iter()
            .map(|h| self.schema.get(h).map(|c| c.data_type))
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(InfrastructureError::from)?;
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .zip(&types)
                .map(|((header, cell), data_type)| (header.to_string(), parse_cell(cell, *data_type)))
                .collect();
            records.push(record);
        }

        debug!(rows = records.len(), columns = headers.len(), "CSV source read");
        Ok(SourceBatch {
            schema: self.schema.clone(),
            records,
        })
    }
}

/// Empty cells become null except in string columns. Cells that do not parse
/// as their declared type are kept as text so loading reports the mismatch.
fn parse_cell(cell: &str, data_type: Option<DataType>) -> Value {
    let trimmed = cell.trim();
    let parsed = match data_type {
        None | Some(DataType::String) => return Value::from(cell),
        _ if trimmed.is_empty() => return Value::Null,
        Some(DataType::Integer) => trimmed.parse::<i64>().ok().map(Value::Int),
        Some(DataType::Float) => trimmed.parse::<f64>().ok().map(Value::Float),
        Some(DataType::Boolean) => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
    };
    parsed.unwrap_or_else(|| Value::from(cell))
}
