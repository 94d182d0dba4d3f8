// sieve-core/src/domain/dataset/mod.rs
//
// Column store: typed values, schema, and the immutable dataset.

pub mod schema;
pub mod store;
pub mod value;

pub use schema::{Column, Schema};
pub use store::{Dataset, Record, Row};
pub use value::{DataType, Value};
