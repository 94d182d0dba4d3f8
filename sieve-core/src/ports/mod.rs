// sieve-core/src/ports/mod.rs

pub mod sink;
pub mod source;

pub use sink::{GroupPayload, ResultSink};
pub use source::{SourceBatch, SourceReader};
