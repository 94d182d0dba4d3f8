// sieve-core/src/infrastructure/adapters/json_sink.rs

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::casting::RejectedRow;
use crate::domain::dataset::Row;
use crate::domain::quality::Verdict;
use crate::error::SieveError;
use crate::infrastructure::fs::write_json;
use crate::ports::sink::{GroupPayload, ResultSink};

/// Writes each group to `<dir>/<group>.json`, atomically.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn group_path(&self, group: &str) -> PathBuf {
        self.dir.join(format!("{}.json", group))
    }
}

#[derive(Serialize)]
struct GroupDocument<'a> {
    group: &'a str,
    cast: bool,
    row_count: usize,
    rows: Vec<PersistedRow<'a>>,
    #[serde(skip_serializing_if = "no_rejects")]
    rejected: &'a [RejectedRow],
}

#[derive(Serialize)]
struct PersistedRow<'a> {
    source_row: usize,
    values: Row<'a>,
    /// Rule outcomes, kept only for failing rows.
    #[serde(skip_serializing_if = "is_pass")]
    verdict: &'a Verdict,
}

fn no_rejects(rejected: &&[RejectedRow]) -> bool {
    rejected.is_empty()
}

fn is_pass(verdict: &&Verdict) -> bool {
    verdict.is_pass()
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn persist_group(&self, group: GroupPayload<'_>) -> Result<(), SieveError> {
        let rows: Vec<PersistedRow<'_>> = group
            .rows()
            .map(|(source_row, values, verdict)| PersistedRow {
                source_row,
                values,
                verdict,
            })
            .collect();

        let document = GroupDocument {
            group: group.name,
            cast: group.cast,
            row_count: rows.len(),
            rows,
            rejected: group.rejected,
        };

        let path = self.group_path(group.name);
        write_json(&path, &document)?;
        info!(group = group.name, path = ?path, rows = document.row_count, "Group persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Column, DataType, Dataset, Record, Schema, Value};
    use crate::domain::quality::RuleFailure;
    use anyhow::Result;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_group_file_layout() -> Result<()> {
        let dir = tempdir()?;
        let sink = JsonFileSink::new(dir.path());

        let ds = Dataset::load(
            vec![
                Record::from([("released_year".to_string(), Value::from("1899"))]),
                Record::from([("released_year".to_string(), Value::from("2014"))]),
            ],
            Schema::new(vec![Column::new("released_year", DataType::String)])?,
        )?;
        let verdicts = vec![
            Verdict::Fail(vec![RuleFailure {
                rule: "released_year".into(),
                findings: Vec::new(),
            }]),
            Verdict::Pass,
        ];

        sink.persist_group(GroupPayload {
            name: "mixed",
            dataset: &ds,
            verdicts: &verdicts,
            source_rows: &[4, 7],
            rejected: &[],
            cast: false,
        })
        .await?;

        let text = std::fs::read_to_string(sink.group_path("mixed"))?;
        let doc: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(doc["row_count"], 2);
        assert_eq!(doc["rows"][0]["source_row"], 4);
        assert_eq!(doc["rows"][0]["values"]["released_year"], "1899");
        assert_eq!(doc["rows"][0]["verdict"]["status"], "fail");
        assert_eq!(
            doc["rows"][0]["verdict"]["failures"][0]["rule"],
            "released_year"
        );
        assert!(doc["rows"][1].get("verdict").is_none());
        assert!(doc.get("rejected").is_none());
        Ok(())
    }
}
