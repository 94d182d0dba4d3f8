// sieve-core/src/domain/quality/mod.rs
//
// Predicates, statistics and the rule engine that turns them into verdicts.

pub mod config;
pub mod dataset_check;
pub mod engine;
pub mod predicate;
pub mod rule;
pub mod statistics;
pub mod verdict;

pub use config::{Combinator, DatasetFailurePolicy, QualityConfig};
pub use dataset_check::{DatasetCheck, DatasetCheckKind, DatasetCheckResult};
pub use engine::{BatchFinding, Evaluation, RuleEngine, evaluate_rules};
pub use predicate::RowPredicate;
pub use rule::{AllowLists, RuleSet, RuleSpec};
pub use statistics::{DatasetStatistics, Metric, StatisticsRequest};
pub use verdict::{FailureCode, Finding, Outcome, RuleFailure, Verdict};
