// sieve-core/src/application/mod.rs

pub mod clean;
pub mod pipeline;
pub mod report;

pub use clean::clean_project;
pub use pipeline::{BatchPlan, REPORT_FILE, run_batch};
pub use report::{BatchReport, GroupSummary};
