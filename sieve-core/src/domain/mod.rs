pub mod casting;
pub mod dataset;
pub mod error;
pub mod project;
pub mod quality;
pub mod routing;

// Handy re-exports to keep imports short elsewhere
pub use error::DomainError;
