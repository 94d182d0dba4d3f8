// sieve/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug sieve run ... to see per-group details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            fail_on_findings,
        } => commands::run::execute(project_dir, fail_on_findings).await,
        Commands::Check { project_dir } => commands::check::execute(project_dir),
        Commands::Stats {
            project_dir,
            column,
        } => commands::stats::execute(project_dir, column),
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
