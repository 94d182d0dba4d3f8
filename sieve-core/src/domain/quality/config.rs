// sieve-core/src/domain/quality/config.rs
//
// Declarative rule definitions as they appear in YAML. Compiled into a
// `RuleSet` before any data is touched.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::dataset::Value;
use crate::domain::quality::statistics::Metric;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// What happens to row verdicts when a dataset-level check fails.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFailurePolicy {
    /// Rows are still evaluated individually; the batch failure is reported apart.
    #[default]
    EvaluateRows,
    /// Every row fails with the failed dataset checks as reasons.
    FailAll,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
pub struct QualityConfig {
    #[serde(default)]
    pub on_dataset_failure: DatasetFailurePolicy,

    #[serde(default)]
    #[validate(nested)]
    pub dataset_checks: Vec<DatasetCheckConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct RuleConfig {
    #[validate(length(min = 1, message = "Rule name cannot be empty"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub combinator: Combinator,

    #[validate(length(min = 1, message = "A rule needs at least one check"))]
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckConfig {
    NotNull {
        column: String,
    },
    Contains {
        column: String,
        pattern: String,
    },
    Matches {
        column: String,
        regex: String,
    },
    Range {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Length {
        column: String,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    /// Allow-list given inline (`values`) or by name (`allow_list`).
    InSet {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<Value>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allow_list: Option<String>,
    },
    ZScore {
        column: String,
        max: f64,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct DatasetCheckConfig {
    #[validate(length(min = 1, message = "Dataset check name cannot be empty"))]
    pub name: String,

    #[serde(flatten)]
    pub kind: DatasetCheckKindConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum DatasetCheckKindConfig {
    RowCount {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Statistic {
        column: String,
        metric: Metric,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Distribution {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<Value>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allow_list: Option<String>,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}
