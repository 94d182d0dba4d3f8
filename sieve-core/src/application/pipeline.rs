// sieve-core/src/application/pipeline.rs

use futures::StreamExt;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, instrument};

use crate::application::report::{BatchReport, GroupSummary};
use crate::domain::casting::{CastOutcome, RejectedRow, SchemaCaster};
use crate::domain::dataset::{Dataset, Schema};
use crate::domain::error::DomainError;
use crate::domain::project::ProjectConfig;
use crate::domain::quality::{DatasetStatistics, RuleSet, evaluate_rules};
use crate::domain::routing::{GroupClassifier, RoutedGroup, Router};
use crate::error::SieveError;
use crate::ports::sink::{GroupPayload, ResultSink};

/// Groups processed at once after routing.
const GROUP_CONCURRENCY: usize = 8;

/// File name reserved for the batch report in the target directory.
pub const REPORT_FILE: &str = "run_results";

/// Everything a batch needs, compiled and checked against the source schema
/// before any row is read.
#[derive(Debug)]
pub struct BatchPlan {
    rules: RuleSet,
    router: Router,
    cast_groups: HashSet<String>,
    caster: Option<SchemaCaster>,
}

impl BatchPlan {
    pub fn new(rules: RuleSet, router: Router) -> Self {
        Self {
            rules,
            router,
            cast_groups: HashSet::new(),
            caster: None,
        }
    }

    /// Casts the named groups with `caster` before they are persisted.
    pub fn with_cast(
        mut self,
        caster: SchemaCaster,
        groups: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.caster = Some(caster);
        self.cast_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[instrument(skip_all, fields(project = %config.name))]
    pub fn from_config(config: &ProjectConfig, schema: &Schema) -> Result<Self, SieveError> {
        let rules = RuleSet::compile(&config.quality, schema, &config.allow_lists)?;

        let known: HashSet<&str> = rules
            .rules()
            .iter()
            .map(|r| r.name())
            .chain(rules.dataset_checks().iter().map(|c| c.name.as_str()))
            .collect();

        let mut classifiers = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            let invalid = |reason: String| DomainError::InvalidRoute {
                route: route.name.clone(),
                reason,
            };
            if !is_file_safe(&route.name) || route.name == REPORT_FILE {
                return Err(invalid(
                    "group names may only use letters, digits, '_' and '-', and must not be 'run_results'"
                        .to_string(),
                )
                .into());
            }
            if let Some(rule) = &route.rule
                && !known.contains(rule.as_str())
            {
                return Err(invalid(format!("unknown rule '{}'", rule)).into());
            }
            if route.cast && config.schema_mapping.is_none() {
                return Err(invalid("`cast: true` needs a `schema_mapping`".to_string()).into());
            }
            classifiers.push(GroupClassifier::from_config(route)?);
        }

        let mut plan = Self::new(rules, Router::new(classifiers)?);

        if let Some(mapping) = &config.schema_mapping {
            for entry in &mapping.columns {
                schema.require(&entry.source, "schema mapping")?;
            }
            let cast_groups = config.routes.iter().filter(|r| r.cast).map(|r| r.name.clone());
            plan = plan.with_cast(SchemaCaster::new(mapping.clone()), cast_groups);
        }

        info!(
            rules = plan.rules.rules().len(),
            dataset_checks = plan.rules.dataset_checks().len(),
            groups = plan.router.classifiers().len(),
            "Batch plan ready"
        );
        Ok(plan)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    fn caster_for(&self, group: &str) -> Option<&SchemaCaster> {
        self.caster
            .as_ref()
            .filter(|_| self.cast_groups.contains(group))
    }
}

fn is_file_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Runs one batch: statistics, evaluation, routing, then per-group cast and
/// persistence. Any structural error aborts the batch.
#[instrument(skip_all, fields(rows = dataset.len()))]
pub async fn run_batch(
    plan: &BatchPlan,
    dataset: &Dataset,
    sink: &dyn ResultSink,
) -> Result<BatchReport, SieveError> {
    let start_time = Instant::now();

    // 1. Statistics snapshot, published before any row is evaluated
    let stats = DatasetStatistics::compute(dataset, &plan.rules.statistics_requests())?;

    // 2. Verdicts
    let evaluation = evaluate_rules(dataset, &stats, &plan.rules)?;

    // 3. Partition
    let routing = plan.router.route(&evaluation)?;

    // 4. Per-group post-processing, bounded concurrency
    let tasks = routing
        .groups()
        .map(|group| process_group(plan, group, sink));
    let results: Vec<Result<GroupSummary, SieveError>> = futures::stream::iter(tasks)
        .buffer_unordered(GROUP_CONCURRENCY)
        .collect()
        .await;

    let mut groups = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    groups.sort_by(|a, b| a.name.cmp(&b.name));

    let elapsed_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
    let report = BatchReport::new(&evaluation, groups, elapsed_ms);
    info!(
        passed = report.passed_rows,
        failed = report.failed_rows,
        elapsed_ms,
        "Batch complete"
    );
    Ok(report)
}

async fn process_group(
    plan: &BatchPlan,
    group: &RoutedGroup,
    sink: &dyn ResultSink,
) -> Result<GroupSummary, SieveError> {
    let Some(caster) = plan.caster_for(&group.name) else {
        sink.persist_group(GroupPayload {
            name: &group.name,
            dataset: &group.dataset,
            verdicts: &group.verdicts,
            source_rows: &group.source_rows,
            rejected: &[],
            cast: false,
        })
        .await?;
        return Ok(GroupSummary {
            name: group.name.clone(),
            routed: group.len(),
            persisted: group.len(),
            cast: false,
            rejected: Vec::new(),
        });
    };

    let CastOutcome { dataset, rejected } = caster.cast(&group.dataset).map_err(|e| match e {
        DomainError::CastFailure {
            row,
            column,
            value,
            target,
        } => DomainError::CastFailure {
            row: group.source_rows.get(row).copied().unwrap_or(row),
            column,
            value,
            target,
        },
        other => other,
    })?;
    let rejected = to_source_rows(rejected, &group.source_rows);

    let dropped: HashSet<usize> = rejected.iter().map(|r| r.row).collect();
    let (source_rows, verdicts): (Vec<usize>, Vec<_>) = group
        .source_rows
        .iter()
        .zip(&group.verdicts)
        .filter(|&(row, _)| !dropped.contains(row))
        .map(|(&row, verdict)| (row, verdict.clone()))
        .unzip();

    sink.persist_group(GroupPayload {
        name: &group.name,
        dataset: &dataset,
        verdicts: &verdicts,
        source_rows: &source_rows,
        rejected: &rejected,
        cast: true,
    })
    .await?;

    Ok(GroupSummary {
        name: group.name.clone(),
        routed: group.len(),
        persisted: dataset.len(),
        cast: true,
        rejected,
    })
}

/// Re-indexes cast rejections from group positions to source rows.
fn to_source_rows(rejected: Vec<RejectedRow>, source_rows: &[usize]) -> Vec<RejectedRow> {
    rejected
        .into_iter()
        .map(|mut r| {
            let source = source_rows.get(r.row).copied().unwrap_or(r.row);
            r.row = source;
            for failure in &mut r.failures {
                failure.row = source;
            }
            r
        })
        .collect()
}
