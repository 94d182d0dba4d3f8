// sieve-core/src/domain/casting/caster.rs

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::casting::mapping::{CastPolicy, MappingEntry, SchemaMapping, TargetType};
use crate::domain::dataset::{DataType, Dataset, Row, Schema, Value};
use crate::domain::error::DomainError;

/// One cell that could not be cast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastFailure {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub target: String,
}

impl From<CastFailure> for DomainError {
    fn from(f: CastFailure) -> Self {
        DomainError::CastFailure {
            row: f.row,
            column: f.column,
            value: f.value,
            target: f.target,
        }
    }
}

/// A row left out of the cast dataset, with every failing cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub failures: Vec<CastFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub dataset: Dataset,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone)]
pub struct SchemaCaster {
    mapping: SchemaMapping,
}

impl SchemaCaster {
    pub fn new(mapping: SchemaMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    pub fn cast(&self, dataset: &Dataset) -> Result<CastOutcome, DomainError> {
        cast_schema(dataset, &self.mapping)
    }
}

/// Casts every row to the mapping's target schema. A row is kept only if all
/// of its cells cast; otherwise it is rejected (or the call fails under
/// `CastPolicy::Abort`).
#[instrument(skip_all, fields(rows = dataset.len(), columns = mapping.columns.len()))]
pub fn cast_schema(dataset: &Dataset, mapping: &SchemaMapping) -> Result<CastOutcome, DomainError> {
    let positions = mapping
        .columns
        .iter()
        .map(|entry| {
            dataset
                .schema()
                .position(&entry.source)
                .ok_or_else(|| DomainError::UnknownColumn {
                    column: entry.source.clone(),
                    context: "schema mapping".to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let target = Schema::new(mapping.columns.iter().map(MappingEntry::target_column).collect())?;

    let rows: Vec<Row<'_>> = dataset.rows().collect();
    let results: Vec<Result<Vec<Value>, RejectedRow>> = rows
        .par_iter()
        .map(|row| cast_row(row, &positions, &mapping.columns))
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(dataset.len()); target.len()];
    let mut rejected = Vec::new();
    let mut kept = 0usize;

    for result in results {
        match result {
            Ok(values) => {
                kept += 1;
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
            }
            Err(row) if mapping.on_failure == CastPolicy::Abort => {
                if let Some(first) = row.failures.into_iter().next() {
                    return Err(first.into());
                }
            }
            Err(row) => rejected.push(row),
        }
    }

    if !rejected.is_empty() {
        warn!(rejected = rejected.len(), "Rows excluded by schema cast");
    }
    let dataset = Dataset::from_columns(target, columns, kept);
    info!(rows = dataset.len(), "Schema cast applied");

    Ok(CastOutcome { dataset, rejected })
}

fn cast_row(
    row: &Row<'_>,
    positions: &[usize],
    entries: &[MappingEntry],
) -> Result<Vec<Value>, RejectedRow> {
    let mut values = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();

    for (entry, &pos) in entries.iter().zip(positions) {
        let source = row.value_at(pos).unwrap_or(&Value::Null);
        match cast_value(source, entry) {
            Some(value) => values.push(value),
            None => failures.push(CastFailure {
                row: row.index(),
                column: entry.source.clone(),
                value: source
                    .as_text()
                    .map_or_else(|| "null".to_string(), |t| t.into_owned()),
                target: entry.target.to_string(),
            }),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(RejectedRow {
            row: row.index(),
            failures,
        })
    }
}

fn cast_value(value: &Value, entry: &MappingEntry) -> Option<Value> {
    if value.is_null() {
        return entry.nullable.then_some(Value::Null);
    }
    coerce(value, entry.target)
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Converts a non-null value. `None` means the value is outside the target
/// domain.
pub fn coerce(value: &Value, target: TargetType) -> Option<Value> {
    match target.data_type {
        DataType::String => {
            let text = value.as_text()?;
            let fits = target
                .max_length
                .is_none_or(|max| text.chars().count() <= max);
            fits.then(|| Value::Str(text.into_owned()))
        }
        DataType::Integer => match value {
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Float(f)
                if f.is_finite() && f.fract() == 0.0 && (-I64_UPPER..I64_UPPER).contains(f) =>
            {
                Some(Value::Int(*f as i64))
            }
            Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            Value::Bool(b) => Some(Value::Int(i64::from(*b))),
            _ => None,
        },
        DataType::Float => match value {
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            _ => None,
        },
        DataType::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Int(0) => Some(Value::Bool(false)),
            Value::Int(1) => Some(Value::Bool(true)),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Column, Record};
    use anyhow::Result;

    fn raw(rows: &[(&str, &str)]) -> Result<Dataset> {
        let schema = Schema::new(vec![
            Column::new("Series_Title", DataType::String),
            Column::new("Meta_score", DataType::String),
        ])?;
        let records = rows
            .iter()
            .map(|(title, score)| {
                Record::from([
                    ("Series_Title".to_string(), Value::from(*title)),
                    ("Meta_score".to_string(), Value::from(*score)),
                ])
            })
            .collect();
        Ok(Dataset::load(records, schema)?)
    }

    fn mapping(policy: CastPolicy) -> SchemaMapping {
        SchemaMapping {
            on_failure: policy,
            columns: vec![
                MappingEntry::new("Series_Title", TargetType::varchar(12)).renamed("series_title"),
                MappingEntry::new("Meta_score", TargetType::new(DataType::Integer))
                    .renamed("meta_score"),
            ],
        }
    }

    #[test]
    fn test_cast_produces_target_schema() -> Result<()> {
        let ds = raw(&[("Inception", " 74 "), ("Heat", "76")])?;
        let out = cast_schema(&ds, &mapping(CastPolicy::Exclude))?;

        assert!(out.rejected.is_empty());
        let names: Vec<&str> = out.dataset.schema().names().collect();
        assert_eq!(names, vec!["series_title", "meta_score"]);
        assert_eq!(out.dataset.column("meta_score")?, &[Value::Int(74), Value::Int(76)]);
        Ok(())
    }

    #[test]
    fn test_failing_rows_are_excluded_whole() -> Result<()> {
        let ds = raw(&[
            ("Inception", "74"),
            ("The Lord of the Rings", "abc"),
            ("Heat", "76"),
        ])?;
        let out = cast_schema(&ds, &mapping(CastPolicy::Exclude))?;

        assert_eq!(out.dataset.len(), 2);
        assert_eq!(out.rejected.len(), 1);
        let rejected = &out.rejected[0];
        assert_eq!(rejected.row, 1);
        // Both cells are reported, not only the first.
        assert_eq!(rejected.failures.len(), 2);
        assert_eq!(rejected.failures[0].target, "varchar(12)");
        assert_eq!(rejected.failures[1].value, "abc");
        Ok(())
    }

    #[test]
    fn test_abort_policy_is_fatal() -> Result<()> {
        let ds = raw(&[("Heat", "76"), ("Alien", "n/a")])?;
        let res = cast_schema(&ds, &mapping(CastPolicy::Abort));
        assert_eq!(
            res.err(),
            Some(DomainError::CastFailure {
                row: 1,
                column: "Meta_score".into(),
                value: "n/a".into(),
                target: "integer".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_unknown_source_column() -> Result<()> {
        let ds = raw(&[("Heat", "76")])?;
        let mut m = mapping(CastPolicy::Exclude);
        m.columns.push(MappingEntry::new("Gross", TargetType::new(DataType::Float)));
        assert!(matches!(
            cast_schema(&ds, &m),
            Err(DomainError::UnknownColumn { column, .. }) if column == "Gross"
        ));
        Ok(())
    }

    #[test]
    fn test_coercions() {
        let int = TargetType::new(DataType::Integer);
        let float = TargetType::new(DataType::Float);
        let boolean = TargetType::new(DataType::Boolean);

        assert_eq!(coerce(&Value::Float(76.0), int), Some(Value::Int(76)));
        assert_eq!(coerce(&Value::Float(7.5), int), None);
        assert_eq!(coerce(&Value::Float(f64::NAN), int), None);
        assert_eq!(coerce(&Value::Float(1e20), int), None);
        assert_eq!(coerce(&Value::Bool(true), int), Some(Value::Int(1)));
        assert_eq!(coerce(&Value::from("1.5e3"), float), Some(Value::Float(1500.0)));
        assert_eq!(coerce(&Value::from("inf"), float), None);
        assert_eq!(coerce(&Value::from(" Yes "), boolean), Some(Value::Bool(true)));
        assert_eq!(coerce(&Value::Int(2), boolean), None);
        assert_eq!(
            coerce(&Value::Int(2014), TargetType::varchar(4)),
            Some(Value::from("2014"))
        );
        assert_eq!(coerce(&Value::from("12345"), TargetType::varchar(4)), None);
    }

    #[test]
    fn test_nulls_respect_nullability() -> Result<()> {
        let schema = Schema::new(vec![Column::new("Gross", DataType::String)])?;
        let ds = Dataset::load(
            vec![Record::from([("Gross".to_string(), Value::Null)])],
            schema,
        )?;

        let lenient = SchemaMapping {
            on_failure: CastPolicy::Exclude,
            columns: vec![MappingEntry::new("Gross", TargetType::new(DataType::Float))],
        };
        assert_eq!(cast_schema(&ds, &lenient)?.dataset.column("Gross")?, &[Value::Null]);

        let strict = SchemaMapping {
            columns: vec![MappingEntry::new("Gross", TargetType::new(DataType::Float)).required()],
            ..lenient
        };
        let out = cast_schema(&ds, &strict)?;
        assert!(out.dataset.is_empty());
        assert_eq!(out.rejected[0].failures[0].value, "null");
        Ok(())
    }

    #[test]
    fn test_cast_round_trip() -> Result<()> {
        let ds = raw(&[("Heat", "76"), ("Alien", "89")])?;
        let forward = cast_schema(&ds, &mapping(CastPolicy::Abort))?;
        let back = SchemaMapping {
            on_failure: CastPolicy::Abort,
            columns: vec![
                MappingEntry::new("series_title", TargetType::new(DataType::String))
                    .renamed("Series_Title"),
                MappingEntry::new("meta_score", TargetType::new(DataType::String))
                    .renamed("Meta_score"),
            ],
        };
        assert_eq!(cast_schema(&forward.dataset, &back)?.dataset, ds);
        Ok(())
    }

    #[test]
    fn test_empty_mapping_keeps_row_count() -> Result<()> {
        let ds = raw(&[("Heat", "76"), ("Alien", "89")])?;
        let projection = SchemaMapping {
            on_failure: CastPolicy::Exclude,
            columns: Vec::new(),
        };
        let out = cast_schema(&ds, &projection)?;
        assert_eq!(out.dataset.len(), 2);
        assert!(out.dataset.schema().is_empty());
        assert!(out.rejected.is_empty());
        Ok(())
    }
}
