//! # Engine Orchestration
//!
//! Ties discovery, resolution, loading, patching, and asset indexing
//! together behind generation-tagged immutable snapshots and the host
//! query API.
//!
//! - **[`config`]**: engine settings with file loading (TOML/YAML).
//! - **[`host`]**: the [`ModEngine`] orchestrator and the [`LoadReport`]
//!   handed to the host.
//! - **[`snapshot`]**: the published read-only view of one generation.
//! - **[`error`]**: the crate-level error aggregate and `Result` alias.

pub mod config;
pub mod error;
pub mod host;
pub mod snapshot;

pub use config::{ConfigError, EngineConfig};
pub use error::{Error, Result};
pub use host::{CheckReport, LoadReport, ModEngine};
pub use snapshot::Snapshot;

#[cfg(test)]
mod tests;
