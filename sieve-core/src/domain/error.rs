// sieve-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Structural failures. Every variant aborts the batch before verdicts are
/// handed to the caller; value-level findings live in verdicts and cast
/// reports instead.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DomainError {
    #[error("Schema mismatch at row {row}: {detail}")]
    #[diagnostic(
        code(sieve::domain::schema_mismatch),
        help("Every row must carry exactly the declared columns with compatible values.")
    )]
    SchemaMismatch { row: usize, detail: String },

    #[error("Unknown column '{column}' referenced by {context}")]
    #[diagnostic(
        code(sieve::domain::unknown_column),
        help("Check the column names in your rules, routes and schema mapping.")
    )]
    UnknownColumn { column: String, context: String },

    #[error("Duplicate column '{0}' in schema")]
    #[diagnostic(code(sieve::domain::duplicate_column))]
    DuplicateColumn(String),

    #[error("Column '{0}' has no non-null numeric values: mean/stddev are undefined")]
    #[diagnostic(code(sieve::domain::empty_column))]
    EmptyColumn(String),

    #[error("Column '{column}' is declared as {declared}, a numeric summary is not available")]
    #[diagnostic(
        code(sieve::domain::not_numeric),
        help("Numeric statistics require an integer or float column.")
    )]
    NotNumeric { column: String, declared: String },

    #[error("No statistics computed for column '{0}'")]
    #[diagnostic(code(sieve::domain::missing_statistics))]
    MissingStatistics(String),

    #[error("Statistics describe {found} rows but the dataset has {expected}")]
    #[diagnostic(
        code(sieve::domain::stale_statistics),
        help("Recompute the statistics snapshot whenever the dataset changes.")
    )]
    StaleStatistics { expected: usize, found: usize },

    #[error("Statistics were computed from a different dataset")]
    #[diagnostic(
        code(sieve::domain::foreign_statistics),
        help("Compute the snapshot from the dataset being evaluated.")
    )]
    ForeignStatistics,

    #[error("Invalid rule '{rule}': {reason}")]
    #[diagnostic(code(sieve::domain::invalid_rule))]
    InvalidRule { rule: String, reason: String },

    #[error("Invalid route '{route}': {reason}")]
    #[diagnostic(code(sieve::domain::invalid_route))]
    InvalidRoute { route: String, reason: String },

    #[error("Groups {groups:?} do not partition the rows: {detail}")]
    #[diagnostic(
        code(sieve::domain::partition),
        help("The passed/failed split must place every row in exactly one group.")
    )]
    PartitionViolation { groups: Vec<String>, detail: String },

    #[error("Cast failure at row {row} on '{column}': cannot cast {value} to {target}")]
    #[diagnostic(
        code(sieve::domain::cast),
        help("Switch the schema mapping to `on_failure: exclude` to report rows instead of aborting.")
    )]
    CastFailure {
        row: usize,
        column: String,
        value: String,
        target: String,
    },
}
