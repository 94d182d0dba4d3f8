// sieve-core/src/domain/quality/engine.rs

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::domain::dataset::{Dataset, Row};
use crate::domain::error::DomainError;
use crate::domain::quality::config::DatasetFailurePolicy;
use crate::domain::quality::dataset_check::DatasetCheckResult;
use crate::domain::quality::rule::RuleSet;
use crate::domain::quality::statistics::DatasetStatistics;
use crate::domain::quality::verdict::{RuleFailure, Verdict};

/// A failed dataset-level check, reported apart from row verdicts.
pub type BatchFinding = DatasetCheckResult;

/// Owns a compiled rule set and applies it to successive batches.
#[derive(Debug)]
pub struct RuleEngine {
    rules: RuleSet,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn evaluate<'d>(
        &self,
        dataset: &'d Dataset,
        stats: &DatasetStatistics,
    ) -> Result<Evaluation<'d>, DomainError> {
        evaluate_rules(dataset, stats, &self.rules)
    }
}

/// Verdicts stored beside the dataset they describe, one per row, in row order.
#[derive(Debug)]
pub struct Evaluation<'d> {
    dataset: &'d Dataset,
    verdicts: Vec<Verdict>,
    dataset_checks: Vec<DatasetCheckResult>,
}

impl<'d> Evaluation<'d> {
    pub fn dataset(&self) -> &'d Dataset {
        self.dataset
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn dataset_checks(&self) -> &[DatasetCheckResult] {
        &self.dataset_checks
    }

    /// Rows paired with their verdicts, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (Row<'d>, &Verdict)> + '_ {
        self.dataset.rows().zip(self.verdicts.iter())
    }

    pub fn batch_findings(&self) -> Vec<&BatchFinding> {
        self.dataset_checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_pass()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.verdicts.len() - self.passed_count()
    }

    /// Number of rows failing each rule.
    pub fn rule_failure_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for verdict in &self.verdicts {
            for reason in verdict.reasons() {
                *counts.entry(reason).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Evaluates dataset checks once, then every row against the row rules.
///
/// The statistics snapshot must come from `dataset` (or a clone of it): a
/// row-count mismatch is `StaleStatistics`, any other dataset version is
/// `ForeignStatistics`. Any error aborts the whole evaluation.
#[instrument(skip_all, fields(rows = dataset.len(), rules = rules.rules().len()))]
pub fn evaluate_rules<'d>(
    dataset: &'d Dataset,
    stats: &DatasetStatistics,
    rules: &RuleSet,
) -> Result<Evaluation<'d>, DomainError> {
    rules.validate_against(dataset.schema())?;

    if stats.row_count() != dataset.len() {
        return Err(DomainError::StaleStatistics {
            expected: dataset.len(),
            found: stats.row_count(),
        });
    }
    if stats.dataset_id() != dataset.id() {
        return Err(DomainError::ForeignStatistics);
    }

    // 1. Dataset tier
    let dataset_checks = rules
        .dataset_checks()
        .iter()
        .map(|check| check.evaluate(stats))
        .collect::<Result<Vec<_>, _>>()?;

    let failed_checks: Vec<&DatasetCheckResult> =
        dataset_checks.iter().filter(|c| !c.passed).collect();
    for check in &failed_checks {
        warn!(
            check = %check.check,
            observed = check.observed,
            min = ?check.min,
            max = ?check.max,
            "Dataset check failed"
        );
    }

    // 2. Row tier
    let verdicts = if !failed_checks.is_empty() && rules.policy() == DatasetFailurePolicy::FailAll
    {
        let failures: Vec<RuleFailure> = failed_checks
            .iter()
            .map(|c| RuleFailure {
                rule: c.check.clone(),
                findings: Vec::new(),
            })
            .collect();
        vec![Verdict::Fail(failures); dataset.len()]
    } else {
        let rows: Vec<Row<'_>> = dataset.rows().collect();
        rows.par_iter()
            .map(|row| rules.evaluate_row(row, stats))
            .collect::<Result<Vec<_>, _>>()?
    };

    let batch_findings = failed_checks.len();
    let evaluation = Evaluation {
        dataset,
        verdicts,
        dataset_checks,
    };
    info!(
        passed = evaluation.passed_count(),
        failed = evaluation.failed_count(),
        batch_findings,
        "Rules evaluated"
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Column, DataType, Record, Schema, Value};
    use crate::domain::quality::config::Combinator;
    use crate::domain::quality::dataset_check::{DatasetCheck, DatasetCheckKind};
    use crate::domain::quality::predicate::{InSet, Length, NotNull, Range};
    use crate::domain::quality::rule::RuleSpec;
    use crate::domain::quality::verdict::{FailureCode, Outcome};
    use anyhow::Result;

    fn years(values: Vec<Value>) -> Result<Dataset> {
        let records = values
            .into_iter()
            .map(|v| Record::from([("released_year".to_string(), v)]))
            .collect();
        Ok(Dataset::load(
            records,
            Schema::new(vec![Column::new("released_year", DataType::String)])?,
        )?)
    }

    fn released_year_rules() -> RuleSet {
        RuleSet::default().with_rule(
            RuleSpec::new("released_year", Combinator::And)
                .with(NotNull::new("released_year"))
                .with(Length::new("released_year", Some(1), Some(5)))
                .with(InSet::new("released_year", (1900..=2025).map(|y| y.to_string()))),
        )
    }

    fn run<'d>(ds: &'d Dataset, rules: &RuleSet) -> Result<Evaluation<'d>> {
        let stats = DatasetStatistics::compute(ds, &rules.statistics_requests())?;
        Ok(evaluate_rules(ds, &stats, rules)?)
    }

    #[test]
    fn test_released_year_scenario() -> Result<()> {
        let ds = years(vec!["2014".into(), "1899".into(), "".into()])?;
        let eval = run(&ds, &released_year_rules())?;

        assert_eq!(eval.verdicts().len(), 3);
        assert_eq!(eval.verdicts()[0], Verdict::Pass);
        assert_eq!(eval.verdicts()[1].reasons(), vec!["released_year"]);
        assert_eq!(eval.verdicts()[2].reasons(), vec!["released_year"]);
        assert_eq!(eval.passed_count(), 1);
        assert_eq!(eval.failed_count(), 2);
        Ok(())
    }

    #[test]
    fn test_length_and_allow_list_findings() -> Result<()> {
        let rules = RuleSet::default().with_rule(
            RuleSpec::new("released_year", Combinator::And)
                .with(Length::new("released_year", Some(1), Some(5)))
                .with(InSet::new("released_year", ["2014"])),
        );
        let ds = years(vec!["2014".into(), "1899".into(), "".into()])?;
        let eval = run(&ds, &rules)?;

        let finding = |row: usize| -> Option<(&'static str, Outcome)> {
            let failure = eval.verdicts()[row].failures().first()?;
            assert_eq!(failure.rule, "released_year");
            assert_eq!(failure.findings.len(), 1);
            let f = failure.findings.first()?;
            Some((f.check, f.outcome))
        };

        assert_eq!(eval.verdicts()[0], Verdict::Pass);
        assert_eq!(
            finding(1),
            Some(("in_set", Outcome::Invalid(FailureCode::NotInAllowList)))
        );
        // Empty text is present with length 0, below the minimum
        assert_eq!(
            finding(2),
            Some(("length", Outcome::Invalid(FailureCode::LengthOutOfRange)))
        );
        Ok(())
    }

    #[test]
    fn test_verdict_order_matches_rows() -> Result<()> {
        let values: Vec<Value> = (0..1000)
            .map(|i| Value::from(if i % 3 == 0 { "1850" } else { "1999" }))
            .collect();
        let ds = years(values)?;
        let rules = released_year_rules();

        let first = run(&ds, &rules)?;
        assert_eq!(first.verdicts().len(), ds.len());
        for (row, verdict) in first.iter() {
            assert_eq!(verdict.is_pass(), row.index() % 3 != 0);
        }

        // Deterministic across runs.
        let second = run(&ds, &rules)?;
        assert_eq!(first.verdicts(), second.verdicts());
        Ok(())
    }

    fn short_batch(policy: DatasetFailurePolicy) -> RuleSet {
        RuleSet::new(policy)
            .with_dataset_check(DatasetCheck::new(
                "row_count",
                DatasetCheckKind::RowCount {
                    min: Some(500),
                    max: Some(2000),
                },
            ))
            .with_rule(
                RuleSpec::new("released_after_1900", Combinator::And).with(Range::new(
                    "released_year",
                    Some(1900.0),
                    None,
                )),
            )
            .with_rule(RuleSpec::new("present", Combinator::And).with(NotNull::new("released_year")))
    }

    #[test]
    fn test_row_count_failure_is_a_batch_finding() -> Result<()> {
        let ds = years((0..50).map(|_| Value::from("2001")).collect())?;
        let eval = run(&ds, &short_batch(DatasetFailurePolicy::EvaluateRows))?;

        assert_eq!(eval.batch_findings().len(), 1);
        assert_eq!(eval.batch_findings()[0].check, "row_count");
        assert!(eval.verdicts().iter().all(Verdict::is_pass));
        Ok(())
    }

    #[test]
    fn test_row_count_failure_fails_every_row() -> Result<()> {
        let ds = years((0..50).map(|_| Value::from("2001")).collect())?;
        let eval = run(&ds, &short_batch(DatasetFailurePolicy::FailAll))?;

        assert_eq!(eval.verdicts().len(), 50);
        for verdict in eval.verdicts() {
            assert_eq!(verdict.reasons(), vec!["row_count"]);
        }
        assert_eq!(eval.rule_failure_counts().get("row_count"), Some(&50));
        Ok(())
    }

    #[test]
    fn test_stale_statistics_rejected() -> Result<()> {
        let small = years(vec!["2001".into()])?;
        let large = years(vec!["2001".into(), "2002".into()])?;
        let rules = released_year_rules();
        let stats = DatasetStatistics::compute(&small, &rules.statistics_requests())?;

        let res = evaluate_rules(&large, &stats, &rules);
        assert!(matches!(
            res,
            Err(DomainError::StaleStatistics {
                expected: 2,
                found: 1
            })
        ));
        Ok(())
    }

    #[test]
    fn test_statistics_from_same_sized_dataset_rejected() -> Result<()> {
        let first = years(vec!["2001".into(), "2002".into()])?;
        let second = years(vec!["1850".into(), "1860".into()])?;
        let rules = released_year_rules();
        let stats = DatasetStatistics::compute(&first, &rules.statistics_requests())?;

        let res = evaluate_rules(&second, &stats, &rules);
        assert!(matches!(res, Err(DomainError::ForeignStatistics)));

        // A clone is the same version
        let copy = first.clone();
        assert_eq!(evaluate_rules(&copy, &stats, &rules)?.passed_count(), 2);
        Ok(())
    }

    #[test]
    fn test_engine_reuses_rules_across_batches() -> Result<()> {
        let engine = RuleEngine::new(released_year_rules());

        for batch in [vec![Value::from("2014"), Value::from("1899")], vec![Value::from("")]] {
            let ds = years(batch)?;
            let stats = DatasetStatistics::compute(&ds, &engine.rules().statistics_requests())?;
            let eval = engine.evaluate(&ds, &stats)?;
            assert_eq!(eval.verdicts().len(), ds.len());
            assert!(std::ptr::eq(eval.dataset(), &ds));
        }
        Ok(())
    }

    #[test]
    fn test_empty_dataset_yields_no_verdicts() -> Result<()> {
        let ds = years(Vec::new())?;
        let eval = run(&ds, &released_year_rules())?;
        assert!(eval.verdicts().is_empty());
        assert_eq!(eval.failed_count(), 0);
        Ok(())
    }
}
