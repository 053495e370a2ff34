//! # Dependency Resolution
//!
//! Builds a directed constraint graph over discovered manifests and computes
//! a single deterministic load order, or precise diagnostics for everything
//! that cannot be ordered:
//!
//! - **[`graph`]**: constructs the loadable set, separating hard edges
//!   (required, version-checked) from soft edges (optional, influence
//!   ordering only when present) and order-only hints.
//! - **[`order`]**: Kahn's algorithm with `(priority, id)` tie-breaking and
//!   exact cycle-path extraction.
//! - **[`diagnostic`]**: the collected problem reports for the whole load
//!   attempt.

pub mod diagnostic;
pub mod graph;
pub mod order;

pub use diagnostic::{Diagnostic, Severity};
pub use graph::{DependencyEdge, DependencyGraph, EdgeKind};
pub use order::{resolve, sort, LoadOrderResult, Resolution};

#[cfg(test)]
mod tests;
