// sieve-core/src/domain/quality/rule.rs

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::domain::dataset::{Row, Schema, Value};
use crate::domain::error::DomainError;
use crate::domain::quality::config::{
    CheckConfig, Combinator, DatasetCheckConfig, DatasetCheckKindConfig, DatasetFailurePolicy,
    QualityConfig, RuleConfig,
};
use crate::domain::quality::dataset_check::{DatasetCheck, DatasetCheckKind};
use crate::domain::quality::predicate::{
    Contains, InSet, Length, Matches, NotNull, Range, RowPredicate, ZScore,
};
use crate::domain::quality::statistics::{DatasetStatistics, StatisticsRequest};
use crate::domain::quality::verdict::{Finding, RuleFailure, Verdict};

/// Named allow-lists supplied by configuration.
pub type AllowLists = BTreeMap<String, Vec<Value>>;

/// One quality dimension: ordered predicates joined by an explicit combinator.
#[derive(Debug)]
pub struct RuleSpec {
    name: String,
    combinator: Combinator,
    predicates: Vec<Box<dyn RowPredicate>>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, combinator: Combinator) -> Self {
        Self {
            name: name.into(),
            combinator,
            predicates: Vec::new(),
        }
    }

    pub fn with(mut self, predicate: impl RowPredicate + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn push(&mut self, predicate: Box<dyn RowPredicate>) {
        self.predicates.push(predicate);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn predicates(&self) -> &[Box<dyn RowPredicate>] {
        &self.predicates
    }

    /// Evaluates the predicates in declaration order. AND stops at the first
    /// non-pass, OR at the first pass. An empty AND rule passes, an empty OR
    /// rule fails.
    pub fn evaluate(
        &self,
        row: &Row<'_>,
        stats: &DatasetStatistics,
    ) -> Result<Option<RuleFailure>, DomainError> {
        let mut findings = Vec::new();

        for predicate in &self.predicates {
            let outcome = predicate.evaluate(row, stats)?;
            match (self.combinator, outcome.is_pass()) {
                (Combinator::Or, true) => return Ok(None),
                (Combinator::And, true) => continue,
                (combinator, false) => {
                    findings.push(Finding {
                        check: predicate.kind(),
                        column: predicate.column().to_string(),
                        outcome,
                    });
                    if combinator == Combinator::And {
                        break;
                    }
                }
            }
        }

        let failed = match self.combinator {
            Combinator::And => !findings.is_empty(),
            Combinator::Or => true,
        };
        Ok(failed.then(|| RuleFailure {
            rule: self.name.clone(),
            findings,
        }))
    }
}

/// The full, compiled rule configuration: dataset-level checks, row-level
/// rules, and the policy tying them together.
#[derive(Debug, Default)]
pub struct RuleSet {
    policy: DatasetFailurePolicy,
    dataset_checks: Vec<DatasetCheck>,
    rules: Vec<RuleSpec>,
}

impl RuleSet {
    pub fn new(policy: DatasetFailurePolicy) -> Self {
        Self {
            policy,
            dataset_checks: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_dataset_check(mut self, check: DatasetCheck) -> Self {
        self.dataset_checks.push(check);
        self
    }

    /// Compiles YAML rule definitions: resolves allow-lists, compiles
    /// regexes, checks bounds and name uniqueness, then binds every check
    /// to a column of `schema`.
    pub fn compile(
        config: &QualityConfig,
        schema: &Schema,
        allow_lists: &AllowLists,
    ) -> Result<Self, DomainError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut set = RuleSet::new(config.on_dataset_failure);

        for check in &config.dataset_checks {
            if !seen.insert(&check.name) {
                return Err(invalid(&check.name, "duplicate rule or dataset check name"));
            }
            set.dataset_checks.push(compile_dataset_check(check, allow_lists)?);
        }

        for rule in &config.rules {
            if !seen.insert(&rule.name) {
                return Err(invalid(&rule.name, "duplicate rule or dataset check name"));
            }
            set.rules.push(compile_rule(rule, allow_lists)?);
        }

        set.validate_against(schema)?;

        debug!(
            rules = set.rules.len(),
            dataset_checks = set.dataset_checks.len(),
            "Rule set compiled"
        );
        Ok(set)
    }

    pub fn policy(&self) -> DatasetFailurePolicy {
        self.policy
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    pub fn dataset_checks(&self) -> &[DatasetCheck] {
        &self.dataset_checks
    }

    /// Every referenced column must exist in the schema.
    pub fn validate_against(&self, schema: &Schema) -> Result<(), DomainError> {
        for check in &self.dataset_checks {
            if let Some(column) = check.column() {
                schema.require(column, &format!("dataset check '{}'", check.name))?;
            }
        }
        for rule in &self.rules {
            for predicate in &rule.predicates {
                schema.require(predicate.column(), &format!("rule '{}'", rule.name))?;
            }
        }
        Ok(())
    }

    /// Aggregates the checks read from the statistics snapshot.
    pub fn statistics_requests(&self) -> Vec<StatisticsRequest> {
        self.dataset_checks
            .iter()
            .filter_map(DatasetCheck::requires)
            .chain(
                self.rules
                    .iter()
                    .flat_map(|r| r.predicates.iter().filter_map(|p| p.requires())),
            )
            .collect()
    }

    /// Applies every rule to the row. No short-circuit across rules, so the
    /// failure list is complete and in declaration order.
    pub fn evaluate_row(
        &self,
        row: &Row<'_>,
        stats: &DatasetStatistics,
    ) -> Result<Verdict, DomainError> {
        let mut failures = Vec::new();
        for rule in &self.rules {
            if let Some(failure) = rule.evaluate(row, stats)? {
                failures.push(failure);
            }
        }
        Ok(if failures.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail(failures)
        })
    }
}

fn invalid(rule: &str, reason: impl Into<String>) -> DomainError {
    DomainError::InvalidRule {
        rule: rule.to_string(),
        reason: reason.into(),
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    rule: &str,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), DomainError> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(invalid(
            rule,
            format!("lower bound {} is above upper bound {}", lo, hi),
        )),
        _ => Ok(()),
    }
}

fn resolve_allow_list(
    rule: &str,
    values: &Option<Vec<Value>>,
    allow_list: &Option<String>,
    allow_lists: &AllowLists,
) -> Result<HashSet<String>, DomainError> {
    let values = match (values, allow_list) {
        (Some(values), None) => values,
        (None, Some(name)) => allow_lists
            .get(name)
            .ok_or_else(|| invalid(rule, format!("unknown allow-list '{}'", name)))?,
        _ => {
            return Err(invalid(
                rule,
                "set exactly one of `values` or `allow_list`",
            ));
        }
    };
    Ok(values
        .iter()
        .filter_map(|v| v.as_text().map(|t| t.into_owned()))
        .collect())
}

fn compile_rule(rule: &RuleConfig, allow_lists: &AllowLists) -> Result<RuleSpec, DomainError> {
    let mut spec = RuleSpec::new(rule.name.clone(), rule.combinator);

    for check in &rule.checks {
        let predicate: Box<dyn RowPredicate> = match check {
            CheckConfig::NotNull { column } => Box::new(NotNull::new(column.clone())),
            CheckConfig::Contains { column, pattern } => {
                Box::new(Contains::new(column.clone(), pattern.clone()))
            }
            CheckConfig::Matches { column, regex } => Box::new(
                Matches::new(column.clone(), regex)
                    .map_err(|e| invalid(&rule.name, format!("invalid regex: {}", e)))?,
            ),
            CheckConfig::Range { column, min, max } => {
                check_bounds(&rule.name, *min, *max)?;
                Box::new(Range::new(column.clone(), *min, *max))
            }
            CheckConfig::Length { column, min, max } => {
                check_bounds(&rule.name, *min, *max)?;
                Box::new(Length::new(column.clone(), *min, *max))
            }
            CheckConfig::InSet {
                column,
                values,
                allow_list,
            } => {
                let allowed = resolve_allow_list(&rule.name, values, allow_list, allow_lists)?;
                Box::new(InSet::new(column.clone(), allowed))
            }
            CheckConfig::ZScore { column, max } => {
                if !(*max > 0.0) {
                    return Err(invalid(&rule.name, "z_score max must be positive"));
                }
                Box::new(ZScore::new(column.clone(), *max))
            }
        };
        spec.push(predicate);
    }

    Ok(spec)
}

fn compile_dataset_check(
    check: &DatasetCheckConfig,
    allow_lists: &AllowLists,
) -> Result<DatasetCheck, DomainError> {
    let kind = match &check.kind {
        DatasetCheckKindConfig::RowCount { min, max } => {
            check_bounds(&check.name, *min, *max)?;
            DatasetCheckKind::RowCount {
                min: *min,
                max: *max,
            }
        }
        DatasetCheckKindConfig::Statistic {
            column,
            metric,
            min,
            max,
        } => {
            check_bounds(&check.name, *min, *max)?;
            DatasetCheckKind::Statistic {
                column: column.clone(),
                metric: *metric,
                min: *min,
                max: *max,
            }
        }
        DatasetCheckKindConfig::Distribution {
            column,
            values,
            allow_list,
            min,
            max,
        } => {
            check_bounds(&check.name, *min, *max)?;
            DatasetCheckKind::Distribution {
                column: column.clone(),
                allowed: resolve_allow_list(&check.name, values, allow_list, allow_lists)?,
                min: *min,
                max: *max,
            }
        }
    };
    Ok(DatasetCheck::new(check.name.clone(), kind))
}
