// sieve-core/src/application/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::casting::RejectedRow;
use crate::domain::quality::{BatchFinding, DatasetCheckResult, Evaluation};

/// What happened to one routed group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    /// Rows routed into the group.
    pub routed: usize,
    /// Rows handed to the sink (routed minus cast rejections).
    pub persisted: usize,
    pub cast: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedRow>,
}

/// Outcome of one batch, written as `run_results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub total_rows: usize,
    pub passed_rows: usize,
    pub failed_rows: usize,
    pub dataset_checks: Vec<DatasetCheckResult>,
    pub rule_failures: BTreeMap<String, usize>,
    pub groups: Vec<GroupSummary>,
}

impl BatchReport {
    pub fn new(evaluation: &Evaluation<'_>, groups: Vec<GroupSummary>, elapsed_ms: u64) -> Self {
        Self {
            generated_at: Utc::now(),
            elapsed_ms,
            total_rows: evaluation.verdicts().len(),
            passed_rows: evaluation.passed_count(),
            failed_rows: evaluation.failed_count(),
            dataset_checks: evaluation.dataset_checks().to_vec(),
            rule_failures: evaluation
                .rule_failure_counts()
                .into_iter()
                .map(|(rule, count)| (rule.to_string(), count))
                .collect(),
            groups,
        }
    }

    pub fn batch_findings(&self) -> impl Iterator<Item = &BatchFinding> + '_ {
        self.dataset_checks.iter().filter(|c| !c.passed)
    }

    /// Any failed row, failed dataset check, or cast rejection.
    pub fn has_findings(&self) -> bool {
        self.failed_rows > 0
            || self.batch_findings().next().is_some()
            || self.groups.iter().any(|g| !g.rejected.is_empty())
    }

    pub fn group(&self, name: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.name == name)
    }
}
