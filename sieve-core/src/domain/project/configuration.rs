// sieve-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::casting::SchemaMapping;
use crate::domain::dataset::{Column, Schema};
use crate::domain::error::DomainError;
use crate::domain::quality::{AllowLists, QualityConfig};
use crate::domain::routing::{RouteConfig, default_routes};

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "config-paths", default)]
    pub config_paths: Vec<String>,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    #[validate(nested)]
    pub source: SourceConfig,

    #[serde(default)]
    #[validate(nested)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub allow_lists: AllowLists,

    #[serde(default = "default_routes")]
    #[validate(nested)]
    pub routes: Vec<RouteConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub schema_mapping: Option<SchemaMapping>,
}

/// Where raw rows come from and the schema they must satisfy.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct SourceConfig {
    #[validate(length(min = 1, message = "Source path cannot be empty"))]
    pub path: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[validate(nested)]
    #[validate(length(min = 1, message = "Declare at least one source column"))]
    pub columns: Vec<Column>,
}

impl SourceConfig {
    pub fn schema(&self) -> Result<Schema, DomainError> {
        Schema::new(self.columns.clone())
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_delimiter() -> char {
    ','
}
