// sieve-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

/// Top-level error of the library. Layer errors keep their own diagnostic
/// codes and help text.
#[derive(Error, Debug, Diagnostic)]
pub enum SieveError {
    // --- DOMAIN ERRORS (data contract, rules, routing, casting) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, Parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- APPLICATION ERRORS ---
    #[error("Refusing to touch path outside the project: {0}")]
    #[diagnostic(
        code(sieve::unsafe_path),
        help("`target-path` must be a plain relative directory such as `target`.")
    )]
    UnsafePath(String),
}

impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Infrastructure(InfrastructureError::Io(err))
    }
}
