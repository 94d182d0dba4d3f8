// sieve-core/src/infrastructure/adapters/mod.rs

pub mod csv;
pub mod json_sink;

pub use self::csv::CsvSource;
pub use json_sink::JsonFileSink;
