// sieve-core/src/domain/routing/router.rs

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

use crate::domain::dataset::{Dataset, Row};
use crate::domain::error::DomainError;
use crate::domain::quality::engine::Evaluation;
use crate::domain::quality::verdict::Verdict;
use crate::domain::routing::classifier::{GroupClassifier, RouteCondition};

/// Rows selected by one classifier, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedGroup {
    pub name: String,
    pub dataset: Dataset,
    pub verdicts: Vec<Verdict>,
    /// Position of each row in the evaluated dataset.
    pub source_rows: Vec<usize>,
}

impl RoutedGroup {
    pub fn len(&self) -> usize {
        self.source_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_rows.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Routing {
    groups: BTreeMap<String, RoutedGroup>,
}

impl Routing {
    pub fn get(&self, name: &str) -> Option<&RoutedGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &RoutedGroup> + '_ {
        self.groups.values()
    }

    pub fn into_groups(self) -> impl Iterator<Item = RoutedGroup> {
        self.groups.into_values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every row in `0..total` must belong to exactly one of `names`.
    pub fn check_partition(&self, names: &[&str], total: usize) -> Result<(), DomainError> {
        let violation = |detail: String| DomainError::PartitionViolation {
            groups: names.iter().map(|n| n.to_string()).collect(),
            detail,
        };

        let mut hits = vec![0usize; total];
        for name in names {
            let group = self
                .get(name)
                .ok_or_else(|| violation(format!("group '{}' was not routed", name)))?;
            for &row in &group.source_rows {
                match hits.get_mut(row) {
                    Some(count) => *count += 1,
                    None => return Err(violation(format!("row {} is out of range", row))),
                }
            }
        }

        if let Some((row, count)) = hits.iter().enumerate().find(|&(_, &count)| count != 1) {
            return Err(violation(format!("row {} landed in {} groups", row, count)));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Router {
    classifiers: Vec<GroupClassifier>,
}

impl Router {
    pub fn new(classifiers: Vec<GroupClassifier>) -> Result<Self, DomainError> {
        ensure_unique(&classifiers)?;
        Ok(Self { classifiers })
    }

    pub fn classifiers(&self) -> &[GroupClassifier] {
        &self.classifiers
    }

    pub fn route(&self, evaluation: &Evaluation<'_>) -> Result<Routing, DomainError> {
        route(evaluation, &self.classifiers)
    }
}

fn ensure_unique(classifiers: &[GroupClassifier]) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for classifier in classifiers {
        if !seen.insert(classifier.name()) {
            return Err(DomainError::InvalidRoute {
                route: classifier.name().to_string(),
                reason: "duplicate group name".to_string(),
            });
        }
    }
    Ok(())
}

/// Partitions evaluated rows into named groups. Row content is copied
/// unchanged; the passed/failed split is checked whenever both sides exist.
#[instrument(skip_all, fields(rows = evaluation.verdicts().len(), groups = classifiers.len()))]
pub fn route(
    evaluation: &Evaluation<'_>,
    classifiers: &[GroupClassifier],
) -> Result<Routing, DomainError> {
    ensure_unique(classifiers)?;

    let dataset = evaluation.dataset();
    let verdicts = evaluation.verdicts();
    let rows: Vec<Row<'_>> = dataset.rows().collect();

    let groups: Vec<RoutedGroup> = classifiers
        .par_iter()
        .map(|classifier| {
            let source_rows: Vec<usize> = rows
                .par_iter()
                .zip(verdicts.par_iter())
                .filter(|(row, verdict)| classifier.matches(row, verdict))
                .map(|(row, _)| row.index())
                .collect();
            debug!(group = classifier.name(), rows = source_rows.len(), "Group classified");
            RoutedGroup {
                name: classifier.name().to_string(),
                dataset: dataset.select(&source_rows),
                verdicts: source_rows.iter().map(|&i| verdicts[i].clone()).collect(),
                source_rows,
            }
        })
        .collect();

    let routing = Routing {
        groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
    };

    let side = |condition| {
        classifiers
            .iter()
            .find(|c| c.condition() == Some(condition))
            .map(GroupClassifier::name)
    };
    if let (Some(passed), Some(failed)) = (side(RouteCondition::Passed), side(RouteCondition::Failed))
    {
        routing.check_partition(&[passed, failed], verdicts.len())?;
    }

    Ok(routing)
}
