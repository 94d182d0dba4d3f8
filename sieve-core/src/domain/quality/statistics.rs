// sieve-core/src/domain/quality/statistics.rs

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

use crate::domain::dataset::{DataType, Dataset, Value};
use crate::domain::error::DomainError;

/// Aggregate a dataset-level check can bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Mean,
    Stddev,
    Min,
    Max,
    DistinctCount,
    DistinctRatio,
    NullRatio,
}

impl Metric {
    pub fn requires_numeric(&self) -> bool {
        matches!(self, Self::Mean | Self::Stddev | Self::Min | Self::Max)
    }
}

/// What a check needs precomputed for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub column: String,
    pub numeric: bool,
}

impl StatisticsRequest {
    pub fn categorical(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            numeric: false,
        }
    }

    pub fn numeric(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            numeric: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub data_type: DataType,
    pub rows: usize,
    pub nulls: usize,
    pub non_null: usize,
    pub distinct_count: usize,
    pub distinct_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip)]
    frequencies: HashMap<String, usize>,
}

impl ColumnStatistics {
    /// Share of non-null values whose text rendering is in `allowed`.
    pub fn proportion_in(&self, allowed: &HashSet<String>) -> f64 {
        if self.non_null == 0 {
            return 0.0;
        }
        let matching: usize = self
            .frequencies
            .iter()
            .filter(|(value, _)| allowed.contains(value.as_str()))
            .map(|(_, count)| count)
            .sum();
        matching as f64 / self.non_null as f64
    }

    pub fn frequency(&self, value: &str) -> usize {
        self.frequencies.get(value).copied().unwrap_or(0)
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Mean => self.numeric.as_ref().map(|n| n.mean),
            Metric::Stddev => self.numeric.as_ref().map(|n| n.stddev),
            Metric::Min => self.numeric.as_ref().map(|n| n.min),
            Metric::Max => self.numeric.as_ref().map(|n| n.max),
            Metric::DistinctCount => Some(self.distinct_count as f64),
            Metric::DistinctRatio => Some(self.distinct_ratio),
            Metric::NullRatio => Some(if self.rows == 0 {
                0.0
            } else {
                self.nulls as f64 / self.rows as f64
            }),
        }
    }
}

/// Immutable aggregate snapshot for one dataset version. Built once before
/// row evaluation and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatistics {
    #[serde(skip)]
    dataset_id: u64,
    row_count: usize,
    columns: BTreeMap<String, ColumnStatistics>,
}

impl DatasetStatistics {
    /// Computes aggregates for the requested columns, one pass per column,
    /// columns in parallel.
    #[instrument(skip(dataset, requests), fields(rows = dataset.len(), requested = requests.len()))]
    pub fn compute(
        dataset: &Dataset,
        requests: &[StatisticsRequest],
    ) -> Result<Self, DomainError> {
        // Merge duplicate requests: numeric wins.
        let mut merged: BTreeMap<&str, bool> = BTreeMap::new();
        for req in requests {
            *merged.entry(req.column.as_str()).or_insert(false) |= req.numeric;
        }

        let computed: Vec<ColumnStatistics> = merged
            .into_par_iter()
            .map(|(column, numeric)| compute_column(dataset, column, numeric))
            .collect::<Result<_, _>>()?;

        debug!(columns = computed.len(), "Statistics snapshot published");

        Ok(Self {
            dataset_id: dataset.id(),
            row_count: dataset.len(),
            columns: computed
                .into_iter()
                .map(|stats| (stats.column.clone(), stats))
                .collect(),
        })
    }

    /// Snapshot of every column, without requiring numeric summaries.
    pub fn compute_all(dataset: &Dataset) -> Result<Self, DomainError> {
        let requests: Vec<StatisticsRequest> = dataset
            .schema()
            .names()
            .map(StatisticsRequest::categorical)
            .collect();
        Self::compute(dataset, &requests)
    }

    /// `Dataset::id` of the dataset this snapshot was computed from.
    pub fn dataset_id(&self) -> u64 {
        self.dataset_id
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Result<&ColumnStatistics, DomainError> {
        self.columns
            .get(name)
            .ok_or_else(|| DomainError::MissingStatistics(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&NumericSummary, DomainError> {
        self.column(name)?
            .numeric
            .as_ref()
            .ok_or_else(|| DomainError::MissingStatistics(name.to_string()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnStatistics> + '_ {
        self.columns.values()
    }
}

fn compute_column(
    dataset: &Dataset,
    column: &str,
    numeric_required: bool,
) -> Result<ColumnStatistics, DomainError> {
    let declared = dataset
        .schema()
        .require(column, "statistics request")?
        .data_type;
    if numeric_required && !declared.is_numeric() {
        return Err(DomainError::NotNumeric {
            column: column.to_string(),
            declared: declared.to_string(),
        });
    }

    let values = dataset.column(column)?;
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut nulls = 0usize;
    let mut welford = Welford::default();

    for value in values {
        let Some(text) = value.as_text() else {
            nulls += 1;
            continue;
        };
        *frequencies.entry(text.into_owned()).or_insert(0) += 1;

        if declared.is_numeric()
            && let Some(x) = numeric_value(value)
        {
            welford.push(x);
        }
    }

    let non_null = values.len() - nulls;
    let numeric = welford.finish();
    if numeric_required && numeric.is_none() {
        return Err(DomainError::EmptyColumn(column.to_string()));
    }

    let distinct_count = frequencies.len();
    Ok(ColumnStatistics {
        column: column.to_string(),
        data_type: declared,
        rows: values.len(),
        nulls,
        non_null,
        distinct_count,
        distinct_ratio: if non_null == 0 {
            0.0
        } else {
            distinct_count as f64 / non_null as f64
        },
        numeric,
        frequencies,
    })
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) if f.is_finite() => Some(*f),
        _ => None,
    }
}

/// Welford's online algorithm: single pass, numerically stable.
#[derive(Debug, Default)]
struct Welford {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Welford {
    fn push(&mut self, x: f64) {
        self.count += 1;
        if self.count == 1 {
            self.mean = x;
            self.min = x;
            self.max = x;
            return;
        }
        let old_mean = self.mean;
        self.mean += (x - old_mean) / self.count as f64;
        // M2_new = M2_old + (x - old_mean) * (x - new_mean)
        self.m2 += (x - old_mean) * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    fn finish(self) -> Option<NumericSummary> {
        (self.count > 0).then(|| NumericSummary {
            count: self.count,
            mean: self.mean,
            stddev: (self.m2 / self.count as f64).sqrt(),
            min: self.min,
            max: self.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Column, Record, Schema};
    use anyhow::Result;

    fn dataset(column: Column, values: Vec<Value>) -> Result<Dataset> {
        let name = column.name.clone();
        let schema = Schema::new(vec![column])?;
        let records = values
            .into_iter()
            .map(|v| Record::from([(name.clone(), v)]))
            .collect();
        Ok(Dataset::load(records, schema)?)
    }

    #[test]
    fn test_mean_and_population_stddev() -> Result<()> {
        let values = [2, 4, 4, 4, 5, 5, 7, 9].map(Value::Int).to_vec();
        let ds = dataset(Column::new("score", DataType::Integer), values)?;
        let stats = DatasetStatistics::compute(&ds, &[StatisticsRequest::numeric("score")])?;

        let summary = stats.numeric("score")?;
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.stddev - 2.0).abs() < 1e-12);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.count, 8);
        Ok(())
    }

    #[test]
    fn test_nulls_and_nan_are_skipped_by_numeric_summary() -> Result<()> {
        let values = vec![
            Value::Float(1.0),
            Value::Null,
            Value::Float(f64::NAN),
            Value::Float(3.0),
        ];
        let ds = dataset(Column::new("score", DataType::Float), values)?;
        let stats = DatasetStatistics::compute(&ds, &[StatisticsRequest::numeric("score")])?;

        let col = stats.column("score")?;
        assert_eq!(col.nulls, 1);
        assert_eq!(col.non_null, 3);
        assert_eq!(stats.numeric("score")?.count, 2);
        assert!((stats.numeric("score")?.mean - 2.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_infinite_values_are_skipped_by_numeric_summary() -> Result<()> {
        let values = vec![
            Value::Float(1.0),
            Value::Float(2.0),
            Value::Float(f64::INFINITY),
            Value::Float(f64::NEG_INFINITY),
        ];
        let ds = dataset(Column::new("score", DataType::Float), values)?;
        let stats = DatasetStatistics::compute(&ds, &[StatisticsRequest::numeric("score")])?;

        let summary = stats.numeric("score")?;
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 1.5).abs() < 1e-12);
        assert!((summary.stddev - 0.5).abs() < 1e-12);
        assert_eq!(summary.max, 2.0);
        // Still counted as present values
        assert_eq!(stats.column("score")?.non_null, 4);
        Ok(())
    }

    #[test]
    fn test_all_null_numeric_column_without_numeric_request() -> Result<()> {
        let ds = dataset(
            Column::new("gross", DataType::Float),
            vec![Value::Null, Value::Null],
        )?;
        let stats = DatasetStatistics::compute_all(&ds)?;

        let col = stats.column("gross")?;
        assert_eq!(col.nulls, 2);
        assert!(col.numeric.is_none());
        assert_eq!(col.distinct_ratio, 0.0);
        Ok(())
    }

    #[test]
    fn test_empty_numeric_column_is_an_error() -> Result<()> {
        let ds = dataset(
            Column::new("score", DataType::Float),
            vec![Value::Null, Value::Null],
        )?;
        let res = DatasetStatistics::compute(&ds, &[StatisticsRequest::numeric("score")]);
        assert_eq!(res, Err(DomainError::EmptyColumn("score".into())));

        // Categorical requests on the same column are fine.
        let stats = DatasetStatistics::compute(&ds, &[StatisticsRequest::categorical("score")])?;
        assert_eq!(stats.column("score")?.distinct_ratio, 0.0);
        Ok(())
    }

    #[test]
    fn test_numeric_request_on_text_column() -> Result<()> {
        let ds = dataset(Column::new("title", DataType::String), vec!["a".into()])?;
        let res = DatasetStatistics::compute(&ds, &[StatisticsRequest::numeric("title")]);
        assert!(matches!(res, Err(DomainError::NotNumeric { .. })));

        let res = DatasetStatistics::compute(&ds, &[StatisticsRequest::categorical("nope")]);
        assert!(matches!(res, Err(DomainError::UnknownColumn { .. })));
        Ok(())
    }

    #[test]
    fn test_distinct_ratio_and_distribution() -> Result<()> {
        let values = ["76", "90", "76", "55", "90"]
            .map(Value::from)
            .into_iter()
            .chain([Value::Null])
            .collect();
        let ds = dataset(Column::new("meta_score", DataType::String), values)?;
        let stats = DatasetStatistics::compute(&ds, &[StatisticsRequest::categorical("meta_score")])?;
        let col = stats.column("meta_score")?;

        assert_eq!(col.distinct_count, 3);
        assert!((col.distinct_ratio - 0.6).abs() < 1e-12);
        assert_eq!(col.frequency("76"), 2);

        let allowed: HashSet<String> = ["76", "90"].map(String::from).into();
        assert!((col.proportion_in(&allowed) - 0.8).abs() < 1e-12);
        assert_eq!(col.metric(Metric::NullRatio), Some(1.0 / 6.0));
        assert_eq!(col.metric(Metric::Mean), None);
        Ok(())
    }

    #[test]
    fn test_compute_is_deterministic() -> Result<()> {
        let values = (0..1000).map(|i| Value::Float(i as f64 * 0.37)).collect();
        let ds = dataset(Column::new("x", DataType::Float), values)?;
        let req = [StatisticsRequest::numeric("x"), StatisticsRequest::categorical("x")];
        assert_eq!(
            DatasetStatistics::compute(&ds, &req)?,
            DatasetStatistics::compute(&ds, &req)?
        );
        Ok(())
    }
}
