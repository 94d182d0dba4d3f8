// sieve-core/src/domain/routing/mod.rs
//
// Pure partitioning of evaluated rows into named groups.

pub mod classifier;
pub mod router;

pub use classifier::{GroupClassifier, RouteCondition, RouteConfig, default_routes};
pub use router::{RoutedGroup, Router, Routing, route};
