// sieve-core/src/domain/quality/predicate.rs
//
// Row-level predicate library. Every check is pure: it reads one row (and
// optionally the published statistics snapshot) and returns an Outcome.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use crate::domain::dataset::{Row, Value};
use crate::domain::error::DomainError;
use crate::domain::quality::statistics::{DatasetStatistics, StatisticsRequest};
use crate::domain::quality::verdict::{FailureCode, Outcome};

pub trait RowPredicate: Send + Sync + fmt::Debug {
    /// Short check name used in findings (e.g. "length").
    fn kind(&self) -> &'static str;

    fn column(&self) -> &str;

    /// Aggregates this check reads from the statistics snapshot, if any.
    fn requires(&self) -> Option<StatisticsRequest> {
        None
    }

    fn evaluate(&self, row: &Row<'_>, stats: &DatasetStatistics) -> Result<Outcome, DomainError>;
}

/// Looks the column up and short-circuits null/missing values to `Absent`.
fn present<'a>(row: &Row<'a>, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
}

// --- PRESENCE ---

#[derive(Debug, Clone)]
pub struct NotNull {
    column: String,
}

impl NotNull {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl RowPredicate for NotNull {
    fn kind(&self) -> &'static str {
        "not_null"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        Ok(match present(row, &self.column) {
            None => Outcome::Absent,
            Some(Value::Str(s)) if s.trim().is_empty() => Outcome::Invalid(FailureCode::Empty),
            Some(Value::Float(f)) if f.is_nan() => Outcome::Invalid(FailureCode::NotANumber),
            Some(_) => Outcome::Pass,
        })
    }
}

// --- PATTERN ---

#[derive(Debug, Clone)]
pub struct Contains {
    column: String,
    needle: String,
}

impl Contains {
    pub fn new(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            needle: needle.into(),
        }
    }
}

impl RowPredicate for Contains {
    fn kind(&self) -> &'static str {
        "contains"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        Ok(match present(row, &self.column).and_then(Value::as_text) {
            None => Outcome::Absent,
            Some(text) if text.contains(self.needle.as_str()) => Outcome::Pass,
            Some(_) => Outcome::Invalid(FailureCode::PatternMismatch),
        })
    }
}

/// Regular-expression match. The regex is compiled once, up front.
#[derive(Debug, Clone)]
pub struct Matches {
    column: String,
    regex: Regex,
}

impl Matches {
    pub fn new(column: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            column: column.into(),
            regex: Regex::new(pattern)?,
        })
    }
}

impl RowPredicate for Matches {
    fn kind(&self) -> &'static str {
        "matches"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        Ok(match present(row, &self.column).and_then(Value::as_text) {
            None => Outcome::Absent,
            Some(text) if self.regex.is_match(&text) => Outcome::Pass,
            Some(_) => Outcome::Invalid(FailureCode::PatternMismatch),
        })
    }
}

// --- NUMERIC RANGE ---

/// Inclusive numeric bounds. Text is parsed; anything non-numeric is a
/// range violation.
#[derive(Debug, Clone)]
pub struct Range {
    column: String,
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    pub fn new(column: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            column: column.into(),
            min,
            max,
        }
    }
}

impl RowPredicate for Range {
    fn kind(&self) -> &'static str {
        "range"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        let Some(value) = present(row, &self.column) else {
            return Ok(Outcome::Absent);
        };
        Ok(match value.as_f64() {
            Some(x) if !x.is_nan() && within(x, self.min, self.max) => Outcome::Pass,
            _ => Outcome::Invalid(FailureCode::RangeViolation),
        })
    }
}

// --- STRING LENGTH ---

/// Inclusive bounds on the character count of the value's text rendering.
#[derive(Debug, Clone)]
pub struct Length {
    column: String,
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn new(column: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            column: column.into(),
            min,
            max,
        }
    }
}

impl RowPredicate for Length {
    fn kind(&self) -> &'static str {
        "length"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        Ok(match present(row, &self.column).and_then(Value::as_text) {
            None => Outcome::Absent,
            Some(text) if within(text.chars().count(), self.min, self.max) => Outcome::Pass,
            Some(_) => Outcome::Invalid(FailureCode::LengthOutOfRange),
        })
    }
}

// --- SET MEMBERSHIP ---

#[derive(Debug, Clone)]
pub struct InSet {
    column: String,
    allowed: HashSet<String>,
}

impl InSet {
    pub fn new<I, S>(column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl RowPredicate for InSet {
    fn kind(&self) -> &'static str {
        "in_set"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn evaluate(&self, row: &Row<'_>, _: &DatasetStatistics) -> Result<Outcome, DomainError> {
        Ok(match present(row, &self.column).and_then(Value::as_text) {
            None => Outcome::Absent,
            Some(text) if self.allowed.contains(&*text) => Outcome::Pass,
            Some(_) => Outcome::Invalid(FailureCode::NotInAllowList),
        })
    }
}

// --- DISPERSION ---

/// `|x - mean| / stddev <= max`, reading mean and stddev from the snapshot.
/// A zero-dispersion column has no outliers.
#[derive(Debug, Clone)]
pub struct ZScore {
    column: String,
    max: f64,
}

impl ZScore {
    pub fn new(column: impl Into<String>, max: f64) -> Self {
        Self {
            column: column.into(),
            max,
        }
    }
}

impl RowPredicate for ZScore {
    fn kind(&self) -> &'static str {
        "z_score"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn requires(&self) -> Option<StatisticsRequest> {
        Some(StatisticsRequest::numeric(self.column.clone()))
    }

    fn evaluate(&self, row: &Row<'_>, stats: &DatasetStatistics) -> Result<Outcome, DomainError> {
        let summary = stats.numeric(&self.column)?;
        let Some(value) = present(row, &self.column) else {
            return Ok(Outcome::Absent);
        };
        let Some(x) = value.as_f64().filter(|x| !x.is_nan()) else {
            return Ok(Outcome::Invalid(FailureCode::NotANumber));
        };
        if summary.stddev <= 1e-12 {
            return Ok(Outcome::Pass);
        }
        let z = ((x - summary.mean) / summary.stddev).abs();
        Ok(if z <= self.max {
            Outcome::Pass
        } else {
            Outcome::Invalid(FailureCode::Outlier)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Column, DataType, Dataset, Record, Schema};
    use anyhow::{Result, anyhow};

    fn single(column: Column, values: Vec<Value>) -> Result<Dataset> {
        let name = column.name.clone();
        let records = values
            .into_iter()
            .map(|v| Record::from([(name.clone(), v)]))
            .collect();
        Ok(Dataset::load(records, Schema::new(vec![column])?)?)
    }

    fn outcomes(pred: &dyn RowPredicate, ds: &Dataset, stats: &DatasetStatistics) -> Result<Vec<Outcome>> {
        ds.rows()
            .map(|row| pred.evaluate(&row, stats).map_err(|e| anyhow!(e)))
            .collect()
    }

    #[test]
    fn test_not_null_distinguishes_absent_from_empty() -> Result<()> {
        let ds = single(
            Column::new("title", DataType::String),
            vec!["Heat".into(), "  ".into(), Value::Null],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        assert_eq!(
            outcomes(&NotNull::new("title"), &ds, &stats)?,
            vec![
                Outcome::Pass,
                Outcome::Invalid(FailureCode::Empty),
                Outcome::Absent
            ]
        );
        Ok(())
    }

    #[test]
    fn test_not_null_flags_nan() -> Result<()> {
        let ds = single(
            Column::new("meta_score", DataType::Float),
            vec![Value::Float(f64::NAN), Value::Float(80.0)],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        assert_eq!(
            outcomes(&NotNull::new("meta_score"), &ds, &stats)?,
            vec![Outcome::Invalid(FailureCode::NotANumber), Outcome::Pass]
        );
        Ok(())
    }

    #[test]
    fn test_range_boundaries_are_inclusive() -> Result<()> {
        let ds = single(
            Column::new("year", DataType::Integer),
            [1899, 1900, 2020, 2021].map(Value::Int).to_vec(),
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        let pred = Range::new("year", Some(1900.0), Some(2020.0));
        assert_eq!(
            outcomes(&pred, &ds, &stats)?,
            vec![
                Outcome::Invalid(FailureCode::RangeViolation),
                Outcome::Pass,
                Outcome::Pass,
                Outcome::Invalid(FailureCode::RangeViolation),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_range_on_text_values() -> Result<()> {
        let ds = single(
            Column::new("year", DataType::String),
            vec!["2014".into(), "soon".into(), Value::Null],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        let pred = Range::new("year", Some(1900.0), None);
        assert_eq!(
            outcomes(&pred, &ds, &stats)?,
            vec![
                Outcome::Pass,
                Outcome::Invalid(FailureCode::RangeViolation),
                Outcome::Absent
            ]
        );
        Ok(())
    }

    #[test]
    fn test_length_counts_characters() -> Result<()> {
        let ds = single(
            Column::new("title", DataType::String),
            vec!["Amélie".into(), "".into(), "x".repeat(70).into()],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        let pred = Length::new("title", Some(1), Some(69));
        assert_eq!(
            outcomes(&pred, &ds, &stats)?,
            vec![
                Outcome::Pass,
                Outcome::Invalid(FailureCode::LengthOutOfRange),
                Outcome::Invalid(FailureCode::LengthOutOfRange),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_pattern_checks() -> Result<()> {
        let ds = single(
            Column::new("poster_link", DataType::String),
            vec!["https://m.media-amazon.com/a.jpg".into(), "n/a".into()],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;

        let contains = Contains::new("poster_link", "http");
        assert_eq!(
            outcomes(&contains, &ds, &stats)?,
            vec![Outcome::Pass, Outcome::Invalid(FailureCode::PatternMismatch)]
        );

        let matches = Matches::new("poster_link", r"\.jpg$")?;
        assert_eq!(
            outcomes(&matches, &ds, &stats)?,
            vec![Outcome::Pass, Outcome::Invalid(FailureCode::PatternMismatch)]
        );
        assert!(Matches::new("poster_link", "[unclosed").is_err());
        Ok(())
    }

    #[test]
    fn test_membership_uses_text_rendering() -> Result<()> {
        let ds = single(
            Column::new("meta_score", DataType::Integer),
            vec![Value::Int(76), Value::Int(12), Value::Null],
        )?;
        let stats = DatasetStatistics::compute(&ds, &[])?;
        let pred = InSet::new("meta_score", ["76", "90"]);
        assert_eq!(
            outcomes(&pred, &ds, &stats)?,
            vec![
                Outcome::Pass,
                Outcome::Invalid(FailureCode::NotInAllowList),
                Outcome::Absent
            ]
        );
        Ok(())
    }

    #[test]
    fn test_z_score_reads_snapshot() -> Result<()> {
        let ds = single(
            Column::new("score", DataType::Integer),
            [2, 4, 4, 4, 5, 5, 7, 9].map(Value::Int).to_vec(),
        )?;
        let pred = ZScore::new("score", 1.5);
        let req = pred.requires().ok_or_else(|| anyhow!("z_score needs stats"))?;
        let stats = DatasetStatistics::compute(&ds, &[req])?;

        // mean 5, stddev 2: 2 -> z 1.5 (pass), 9 -> z 2.0 (outlier)
        let got = outcomes(&pred, &ds, &stats)?;
        assert_eq!(got.first(), Some(&Outcome::Pass));
        assert_eq!(got.last(), Some(&Outcome::Invalid(FailureCode::Outlier)));

        // Without a snapshot entry the check cannot run.
        let empty = DatasetStatistics::compute(&ds, &[])?;
        let row = ds.row(0).ok_or_else(|| anyhow!("row 0"))?;
        assert!(matches!(
            pred.evaluate(&row, &empty),
            Err(DomainError::MissingStatistics(_))
        ));
        Ok(())
    }

    #[test]
    fn test_z_score_ignores_infinite_values_in_snapshot() -> Result<()> {
        let ds = single(
            Column::new("meta_score", DataType::Float),
            vec![
                Value::Float(74.0),
                Value::Float(76.0),
                Value::Float(f64::INFINITY),
            ],
        )?;
        let pred = ZScore::new("meta_score", 3.0);
        let req = pred.requires().ok_or_else(|| anyhow!("z_score needs stats"))?;
        let stats = DatasetStatistics::compute(&ds, &[req])?;

        assert_eq!(
            outcomes(&pred, &ds, &stats)?,
            vec![
                Outcome::Pass,
                Outcome::Pass,
                Outcome::Invalid(FailureCode::Outlier)
            ]
        );
        Ok(())
    }
}
