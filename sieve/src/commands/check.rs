// sieve/src/commands/check.rs
//
// USE CASE: Validate the project without touching data.

use std::path::PathBuf;

use sieve_core::application::BatchPlan;

use super::load_config;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let schema = config.source.schema()?;

    let plan = match BatchPlan::from_config(&config, &schema) {
        Ok(plan) => plan,
        Err(e) => {
            // Diagnostic rendering keeps the error code and help text
            eprintln!("❌ Check failed:\n{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };

    let rules = plan.rules();
    println!(
        "   Source: {} ({} columns)",
        config.source.path,
        schema.len()
    );
    println!(
        "   {} rules, {} dataset checks (on failure: {:?})",
        rules.rules().len(),
        rules.dataset_checks().len(),
        rules.policy()
    );
    for classifier in plan.router().classifiers() {
        println!("   ➡️  route '{}'", classifier.name());
    }
    if let Some(mapping) = &config.schema_mapping {
        println!(
            "   🎯 schema mapping: {} columns (on failure: {:?})",
            mapping.columns.len(),
            mapping.on_failure
        );
    }

    println!("✨ Configuration is valid.");
    Ok(())
}
