// sieve-core/src/domain/casting/mod.rs
//
// Target-schema enforcement for routed groups.

pub mod caster;
pub mod mapping;

pub use caster::{CastFailure, CastOutcome, RejectedRow, SchemaCaster, cast_schema, coerce};
pub use mapping::{CastPolicy, MappingEntry, SchemaMapping, TargetType};
