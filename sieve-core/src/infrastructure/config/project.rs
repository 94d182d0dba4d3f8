// sieve-core/src/infrastructure/config/project.rs

use serde::{Deserialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::dataset::Value;
use crate::domain::project::ProjectConfig;
use crate::domain::quality::config::{DatasetCheckConfig, DatasetFailurePolicy, RuleConfig};
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["sieve.yaml", "sieve_project.yaml"];

/// Loads `sieve.yaml`, hydrates satellite files from the first config path,
/// applies environment overrides, then validates the result.
#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Main file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");
    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 2. Satellites
    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    // 3. Environment (SIEVE_TARGET_PATH=/tmp/out sieve run)
    apply_env_overrides(&mut config);

    // 4. Structure
    config.validate()?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_FILE_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_FILE_CANDIDATES
    )))
}

/// Reads one typed YAML file, keeping the path in the error.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let wrap = |source: InfrastructureError| InfrastructureError::Fragment {
        path: path.to_path_buf(),
        source: Box::new(source),
    };
    let content = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    serde_yaml::from_str(&content).map_err(|e| wrap(e.into()))
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    // A. Rules: replace whatever the main file declared
    let qual_path = config_dir.join("quality.yml");
    if qual_path.exists() {
        #[derive(Deserialize)]
        struct QualityWrapper {
            on_dataset_failure: Option<DatasetFailurePolicy>,
            dataset_checks: Option<Vec<DatasetCheckConfig>>,
            rules: Option<Vec<RuleConfig>>,
        }

        let wrapper: QualityWrapper = load_fragment(&qual_path)?;
        if let Some(policy) = wrapper.on_dataset_failure {
            config.quality.on_dataset_failure = policy;
        }
        if let Some(checks) = wrapper.dataset_checks {
            config.quality.dataset_checks = checks;
        }
        if let Some(rules) = wrapper.rules {
            config.quality.rules = rules;
        }
        info!(
            rules = config.quality.rules.len(),
            dataset_checks = config.quality.dataset_checks.len(),
            "  ✅ Quality rules loaded"
        );
    }

    // B. Allow-lists: merged by name, the satellite wins
    let lists_path = config_dir.join("allow_lists.yml");
    if lists_path.exists() {
        #[derive(Deserialize)]
        struct AllowListsWrapper {
            allow_lists: std::collections::BTreeMap<String, Vec<Value>>,
        }

        let wrapper: AllowListsWrapper = load_fragment(&lists_path)?;
        info!(lists = wrapper.allow_lists.len(), "  📋 Allow-lists loaded");
        config.allow_lists.extend(wrapper.allow_lists);
    }

    Ok(())
}

fn apply_env_overrides(config: &mut ProjectConfig) {
    if let Ok(val) = std::env::var("SIEVE_TARGET_PATH") {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Ok(val) = std::env::var("SIEVE_SOURCE_PATH") {
        info!(old = ?config.source.path, new = ?val, "Overriding source path via ENV");
        config.source.path = val;
    }
}
