// sieve/src/commands/run.rs
//
// USE CASE: Run one batch end to end.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use comfy_table::Table;
use sieve_core::application::{BatchPlan, BatchReport, REPORT_FILE, run_batch};
use sieve_core::infrastructure::adapters::JsonFileSink;
use sieve_core::infrastructure::fs::write_json;
use tracing::{debug, info};

use super::{load_config, read_source};

pub async fn execute(project_dir: PathBuf, fail_on_findings: bool) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Config + plan, checked before any row is read
    let config = load_config(&project_dir)?;
    let schema = config.source.schema()?;
    let plan = BatchPlan::from_config(&config, &schema)
        .context("Failed to compile rules and routes")?;

    // B. Source (Infra)
    let dataset = read_source(&project_dir, &config)?;

    // C. Sink
    let target_dir = project_dir.join(&config.target_path);
    fs::create_dir_all(&target_dir)
        .with_context(|| format!("Failed to create target dir {:?}", target_dir))?;
    let sink = JsonFileSink::new(&target_dir);
    debug!(target_dir = %target_dir.display(), "Sink ready");

    // D. Run the batch (Application Layer)
    let report = match run_batch(&plan, &dataset, &sink).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\n💥 CRITICAL BATCH ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let report_path = target_dir.join(format!("{}.json", REPORT_FILE));
    write_json(&report_path, &report)
        .with_context(|| format!("Failed to write {:?}", report_path))?;

    info!(report = %report_path.display(), "Run results written");
    print_summary(&report);

    if fail_on_findings && report.has_findings() {
        eprintln!(
            "\n❌ FAILURE. {} of {} rows failed.",
            report.failed_rows, report.total_rows
        );
        std::process::exit(1);
    }

    println!("\n✨ SUCCESS! Batch finished in {:.2?}", start.elapsed());
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!(
        "\n📋 {} rows: {} passed, {} failed",
        report.total_rows, report.passed_rows, report.failed_rows
    );

    let mut table = Table::new();
    table.set_header(vec!["Group", "Routed", "Persisted", "Cast", "Rejected"]);
    for group in &report.groups {
        table.add_row(vec![
            group.name.clone(),
            group.routed.to_string(),
            group.persisted.to_string(),
            if group.cast { "yes" } else { "-" }.to_string(),
            group.rejected.len().to_string(),
        ]);
    }
    println!("{table}");

    let findings: Vec<_> = report.batch_findings().collect();
    if !findings.is_empty() {
        println!("\n⚠️  Dataset checks failed:");
        for finding in findings {
            println!(
                "   - {} (observed {}, bounds [{}, {}])",
                finding.check,
                finding.observed,
                bound(finding.min),
                bound(finding.max)
            );
        }
    }

    if !report.rule_failures.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Rule", "Failed rows"]);
        for (rule, count) in &report.rule_failures {
            table.add_row(vec![rule.clone(), count.to_string()]);
        }
        println!("{table}");
    }
}

fn bound(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
