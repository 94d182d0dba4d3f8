// sieve-core/src/domain/quality/verdict.rs

use serde::{Serialize, Serializer};

/// Why a present value failed a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    Empty,
    NotANumber,
    PatternMismatch,
    RangeViolation,
    LengthOutOfRange,
    NotInAllowList,
    Outlier,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NotANumber => "not_a_number",
            Self::PatternMismatch => "pattern_mismatch",
            Self::RangeViolation => "range_violation",
            Self::LengthOutOfRange => "length_out_of_range",
            Self::NotInAllowList => "not_in_allow_list",
            Self::Outlier => "outlier",
        }
    }
}

/// Result of one predicate on one row. `Absent` (null or missing) is kept
/// apart from `Invalid` so reports can tell "no value" from "bad value".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Absent,
    Invalid(FailureCode),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Absent => "absent",
            Outcome::Invalid(code) => code.as_str(),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A non-passing predicate inside a failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub check: &'static str,
    pub column: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFailure {
    pub rule: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

/// Per-row outcome, kept beside the dataset rather than inside its columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "failures", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail(Vec<RuleFailure>),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Identifiers of the failed rules, in declaration order.
    pub fn reasons(&self) -> Vec<&str> {
        self.failures().iter().map(|f| f.rule.as_str()).collect()
    }

    pub fn failures(&self) -> &[RuleFailure] {
        match self {
            Verdict::Pass => &[],
            Verdict::Fail(failures) => failures,
        }
    }

    pub fn failed_rule(&self, rule: &str) -> bool {
        self.failures().iter().any(|f| f.rule == rule)
    }
}
