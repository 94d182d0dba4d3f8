// sieve/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Data-quality rule evaluation and routing engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the batch (Source -> Rules -> Routing -> Cast -> Groups)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Exit with error if any row or dataset check failed
        #[arg(long)]
        fail_on_findings: bool,
    },

    /// ✅ Validates the configuration and compiles the rules (no data read)
    Check {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 📊 Prints the statistics snapshot of the source dataset
    Stats {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Restrict to these columns (repeatable)
        #[arg(long)]
        column: Vec<String>,
    },

    /// 🧹 Cleans build artifacts (target/ folder)
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() -> Result<()> {
        let args = Cli::parse_from(["sieve", "run"]);
        match args.command {
            Commands::Run {
                project_dir,
                fail_on_findings,
            } => {
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert!(!fail_on_findings);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_fail_on_findings() -> Result<()> {
        let args = Cli::parse_from([
            "sieve",
            "run",
            "--fail-on-findings",
            "--project-dir",
            "/tmp",
        ]);
        match args.command {
            Commands::Run {
                project_dir,
                fail_on_findings,
            } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp");
                assert!(fail_on_findings);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_stats_columns() -> Result<()> {
        let args = Cli::parse_from([
            "sieve",
            "stats",
            "--column",
            "released_year",
            "--column",
            "gross",
        ]);
        match args.command {
            Commands::Stats { column, .. } => {
                assert_eq!(column, vec!["released_year", "gross"]);
                Ok(())
            }
            _ => bail!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_parse_check() -> Result<()> {
        let args = Cli::parse_from(["sieve", "check", "--project-dir", "demo"]);
        match args.command {
            Commands::Check { project_dir } => {
                assert_eq!(project_dir.to_string_lossy(), "demo");
                Ok(())
            }
            _ => bail!("Expected Check command"),
        }
    }
}
