// sieve-core/src/ports/sink.rs

// Where routed groups go once processed. Transport and file format belong to
// the adapter.

use async_trait::async_trait;

use crate::domain::casting::RejectedRow;
use crate::domain::dataset::{Dataset, Row};
use crate::domain::quality::Verdict;
use crate::error::SieveError;

/// One processed group, ready to persist. `dataset`, `verdicts` and
/// `source_rows` are aligned row by row.
#[derive(Debug, Clone, Copy)]
pub struct GroupPayload<'a> {
    pub name: &'a str,
    pub dataset: &'a Dataset,
    pub verdicts: &'a [Verdict],
    pub source_rows: &'a [usize],
    /// Rows dropped by the schema cast, indexed by source row.
    pub rejected: &'a [RejectedRow],
    pub cast: bool,
}

impl<'a> GroupPayload<'a> {
    pub fn rows(&self) -> impl Iterator<Item = (usize, Row<'a>, &'a Verdict)> + 'a {
        let dataset: &'a Dataset = self.dataset;
        let source_rows = self.source_rows;
        let verdicts = self.verdicts;
        dataset
            .rows()
            .zip(source_rows.iter().copied())
            .zip(verdicts.iter())
            .map(|((row, source), verdict)| (source, row, verdict))
    }
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist_group(&self, group: GroupPayload<'_>) -> Result<(), SieveError>;
}
