// sieve-core/src/ports/source.rs

// Where raw rows come from. The engine never reads files itself: an adapter
// hands over records plus the schema they are expected to satisfy.

use crate::domain::dataset::{Dataset, Record, Schema};
use crate::error::SieveError;

#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl SourceBatch {
    /// Builds the column store, rejecting rows that break the schema.
    pub fn into_dataset(self) -> Result<Dataset, SieveError> {
        Ok(Dataset::load(self.records, self.schema)?)
    }
}

pub trait SourceReader {
    fn read(&self) -> Result<SourceBatch, SieveError>;
}
