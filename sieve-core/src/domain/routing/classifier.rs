// sieve-core/src/domain/routing/classifier.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::domain::dataset::Row;
use crate::domain::error::DomainError;
use crate::domain::quality::verdict::Verdict;

type ClassifierFn = dyn Fn(&Row<'_>, &Verdict) -> bool + Send + Sync;

/// Which built-in condition a route uses.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteCondition {
    Passed,
    Failed,
    /// Rows whose verdict lists the rule named in `rule`.
    FailedRule,
    All,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct RouteConfig {
    #[validate(length(min = 1, message = "Route name cannot be empty"))]
    pub name: String,

    pub when: RouteCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Apply the schema mapping before persisting this group.
    #[serde(default)]
    pub cast: bool,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, when: RouteCondition) -> Self {
        Self {
            name: name.into(),
            when,
            rule: None,
            cast: false,
        }
    }
}

/// The default two-way split. Only the passed group is cast.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            cast: true,
            ..RouteConfig::new("passed", RouteCondition::Passed)
        },
        RouteConfig::new("failed", RouteCondition::Failed),
    ]
}

/// A named, pure predicate over `(Row, Verdict)`.
pub struct GroupClassifier {
    name: String,
    condition: Option<RouteCondition>,
    predicate: Box<ClassifierFn>,
}

impl GroupClassifier {
    /// Ad-hoc classifier. Overlap with other groups is the caller's business.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Row<'_>, &Verdict) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            condition: None,
            predicate: Box::new(predicate),
        }
    }

    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            condition: Some(RouteCondition::Passed),
            ..Self::new(name, |_, v| v.is_pass())
        }
    }

    pub fn failed(name: impl Into<String>) -> Self {
        Self {
            condition: Some(RouteCondition::Failed),
            ..Self::new(name, |_, v| !v.is_pass())
        }
    }

    pub fn failed_rule(name: impl Into<String>, rule: impl Into<String>) -> Self {
        let rule = rule.into();
        Self {
            condition: Some(RouteCondition::FailedRule),
            ..Self::new(name, move |_, v| v.failed_rule(&rule))
        }
    }

    pub fn all(name: impl Into<String>) -> Self {
        Self {
            condition: Some(RouteCondition::All),
            ..Self::new(name, |_, _| true)
        }
    }

    pub fn from_config(config: &RouteConfig) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidRoute {
            route: config.name.clone(),
            reason: reason.to_string(),
        };
        match (config.when, &config.rule) {
            (RouteCondition::FailedRule, Some(rule)) => Ok(Self::failed_rule(&config.name, rule)),
            (RouteCondition::FailedRule, None) => Err(invalid("`failed_rule` needs a `rule`")),
            (_, Some(_)) => Err(invalid("`rule` is only valid with `failed_rule`")),
            (RouteCondition::Passed, None) => Ok(Self::passed(&config.name)),
            (RouteCondition::Failed, None) => Ok(Self::failed(&config.name)),
            (RouteCondition::All, None) => Ok(Self::all(&config.name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self) -> Option<RouteCondition> {
        self.condition
    }

    pub fn matches(&self, row: &Row<'_>, verdict: &Verdict) -> bool {
        (self.predicate)(row, verdict)
    }
}

impl fmt::Debug for GroupClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupClassifier")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
