// sieve-core/src/domain/quality/dataset_check.rs
//
// Dataset-level predicates: evaluated once per batch against the
// statistics snapshot, never per row.

use serde::Serialize;
use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::quality::statistics::{DatasetStatistics, Metric, StatisticsRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetCheckKind {
    /// Total row count within inclusive bounds.
    RowCount {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// One aggregate of one column within inclusive bounds.
    Statistic {
        column: String,
        metric: Metric,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Share of non-null values found in an allow-list within inclusive bounds.
    Distribution {
        column: String,
        allowed: HashSet<String>,
        min: Option<f64>,
        max: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetCheck {
    pub name: String,
    pub kind: DatasetCheckKind,
}

/// Outcome of one dataset-level check; failures are the batch findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetCheckResult {
    pub check: String,
    pub observed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub passed: bool,
}

impl DatasetCheck {
    pub fn new(name: impl Into<String>, kind: DatasetCheckKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            DatasetCheckKind::RowCount { .. } => None,
            DatasetCheckKind::Statistic { column, .. }
            | DatasetCheckKind::Distribution { column, .. } => Some(column),
        }
    }

    pub fn requires(&self) -> Option<StatisticsRequest> {
        match &self.kind {
            DatasetCheckKind::RowCount { .. } => None,
            DatasetCheckKind::Statistic { column, metric, .. } => Some(StatisticsRequest {
                column: column.clone(),
                numeric: metric.requires_numeric(),
            }),
            DatasetCheckKind::Distribution { column, .. } => {
                Some(StatisticsRequest::categorical(column.clone()))
            }
        }
    }

    pub fn evaluate(&self, stats: &DatasetStatistics) -> Result<DatasetCheckResult, DomainError> {
        let (observed, min, max) = match &self.kind {
            DatasetCheckKind::RowCount { min, max } => (
                stats.row_count() as f64,
                min.map(|v| v as f64),
                max.map(|v| v as f64),
            ),
            DatasetCheckKind::Statistic {
                column,
                metric,
                min,
                max,
            } => {
                let observed = stats
                    .column(column)?
                    .metric(*metric)
                    .ok_or_else(|| DomainError::MissingStatistics(column.clone()))?;
                (observed, *min, *max)
            }
            DatasetCheckKind::Distribution {
                column,
                allowed,
                min,
                max,
            } => (stats.column(column)?.proportion_in(allowed), *min, *max),
        };

        let passed = min.is_none_or(|lo| observed >= lo) && max.is_none_or(|hi| observed <= hi);
        Ok(DatasetCheckResult {
            check: self.name.clone(),
            observed,
            min,
            max,
            passed,
        })
    }
}
