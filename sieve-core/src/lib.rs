// sieve-core/src/lib.rs

// 1. Memory safety
#![deny(unsafe_code)]
// 2. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 3. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Boundary contracts: where rows come from, where routed groups go.
pub mod ports;

// 2. Domain (business core)
// Column store, predicates, statistics, rule engine, router, caster.
// Depends on NOTHING else (neither infra nor app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Config files, CSV source, JSON sink, atomic writes.
// Depends on the Domain and the Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Batch orchestration: load -> stats -> evaluate -> route -> cast -> persist.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::SieveError;
