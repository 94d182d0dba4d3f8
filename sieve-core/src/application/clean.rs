// sieve-core/src/application/clean.rs

use std::fs;
use std::path::{Component, Path};
use tracing::info;

use crate::error::SieveError;
use crate::infrastructure::config::project::load_project_config;

/// Removes the configured target directory. Returns whether anything was
/// removed.
pub fn clean_project(project_dir: &Path) -> Result<bool, SieveError> {
    info!("🧹 Initializing Sieve cleanup sequence...");

    let config = load_project_config(project_dir)?;
    let target = Path::new(&config.target_path);

    // Only plain relative paths inside the project may be removed.
    let contained = !target.as_os_str().is_empty()
        && target
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && target.components().any(|c| matches!(c, Component::Normal(_)));
    if !contained {
        return Err(SieveError::UnsafePath(config.target_path));
    }

    let full_path = project_dir.join(target);
    if !full_path.exists() {
        return Ok(false);
    }
    if full_path.is_dir() {
        fs::remove_dir_all(&full_path)?;
    } else {
        fs::remove_file(&full_path)?;
    }
    println!("   🗑️  Artifact removed: {}", config.target_path);
    Ok(true)
}
