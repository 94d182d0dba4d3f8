// sieve-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(sieve::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(sieve::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to load configuration file {path:?}: {source}")]
    #[diagnostic(code(sieve::infra::config_fragment))]
    Fragment {
        path: PathBuf,
        #[source]
        source: Box<InfrastructureError>,
    },

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(sieve::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(sieve::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(sieve::infra::validation),
        help("Fix the fields listed above in sieve.yaml or its satellite files.")
    )]
    Validation(#[from] validator::ValidationErrors),

    // --- DATA FILES ---
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(sieve::infra::csv),
        help("Check the delimiter and that every line has the same number of fields.")
    )]
    Csv(#[from] csv::Error),

    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(sieve::infra::json))]
    Json(#[from] serde_json::Error),
}
