// sieve/src/commands/stats.rs
//
// USE CASE: Inspect the statistics snapshot of the source.

use std::path::PathBuf;

use comfy_table::Table;
use sieve_core::domain::quality::statistics::NumericSummary;
use sieve_core::domain::quality::{DatasetStatistics, StatisticsRequest};

use super::{load_config, read_source};

pub fn execute(project_dir: PathBuf, columns: Vec<String>) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let dataset = read_source(&project_dir, &config)?;
    let schema = dataset.schema();

    // Categorical requests: numeric columns still get a summary when they
    // hold at least one value.
    let (selected, stats) = if columns.is_empty() {
        let names: Vec<String> = schema.names().map(str::to_string).collect();
        (names, DatasetStatistics::compute_all(&dataset)?)
    } else {
        for name in &columns {
            schema.require(name, "stats")?;
        }
        let requests: Vec<StatisticsRequest> = columns
            .iter()
            .map(|name| StatisticsRequest::categorical(name.as_str()))
            .collect();
        let stats = DatasetStatistics::compute(&dataset, &requests)?;
        (columns, stats)
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Column",
        "Type",
        "Rows",
        "Nulls",
        "Distinct",
        "Distinct ratio",
        "Mean",
        "Stddev",
        "Min",
        "Max",
    ]);
    for name in &selected {
        let column = stats.column(name)?;
        let numeric = |f: fn(&NumericSummary) -> f64| {
            column
                .numeric
                .as_ref()
                .map_or_else(|| "-".to_string(), |n| format!("{:.3}", f(n)))
        };
        table.add_row(vec![
            column.column.clone(),
            column.data_type.as_str().to_string(),
            column.rows.to_string(),
            column.nulls.to_string(),
            column.distinct_count.to_string(),
            format!("{:.3}", column.distinct_ratio),
            numeric(|n| n.mean),
            numeric(|n| n.stddev),
            numeric(|n| n.min),
            numeric(|n| n.max),
        ]);
    }
    println!("{table}");
    Ok(())
}
