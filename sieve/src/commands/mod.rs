// sieve/src/commands/mod.rs

pub mod check;
pub mod clean;
pub mod run;
pub mod stats;

use anyhow::Context;
use std::path::Path;

use sieve_core::domain::dataset::Dataset;
use sieve_core::infrastructure::adapters::CsvSource;
use sieve_core::infrastructure::config::{ProjectConfig, load_project_config};
use sieve_core::ports::SourceReader;

/// Loads and validates the project file, printing the banner every command shares.
pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    println!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);
    Ok(config)
}

pub(crate) fn read_source(project_dir: &Path, config: &ProjectConfig) -> anyhow::Result<Dataset> {
    let source = CsvSource::from_config(project_dir, &config.source)?;
    println!("📥 Reading {}", source.path().display());

    let dataset = source
        .read()
        .and_then(|batch| batch.into_dataset())
        .with_context(|| format!("Failed to read source {:?}", source.path()))?;
    println!("   {} rows x {} columns", dataset.len(), dataset.schema().len());
    Ok(dataset)
}
