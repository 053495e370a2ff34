//! # ModForge Core
//!
//! ModForge is a plugin ("mod") engine for a game-style host process. It
//! takes a set of independently authored plugin packages, each declaring an
//! identity, a version, and dependency/ordering constraints, and turns them
//! into a running, observable generation of plugins:
//!
//! - **[`manifest`]**: the declarative model of a plugin (identity, version,
//!   dependency ranges, ordering hints, asset overrides) plus JSON parsing
//!   and asynchronous on-disk discovery.
//! - **[`resolver`]**: builds the dependency graph over discovered manifests,
//!   separates hard and soft edges, and computes a fully deterministic load
//!   order with precise cycle reporting.
//! - **[`loader`]**: loads each plugin's executable unit (statically
//!   registered or a dynamic library) strictly in resolved order, isolating
//!   per-plugin initialization failures, panics, and timeouts.
//! - **[`patch`]**: bookkeeping for runtime behavior modifications —
//!   attribution, explicit per-target chains, and per-plugin revocation.
//! - **[`assets`]**: resolves which plugin provides a logically named
//!   resource, last-loaded plugin winning, host content as fallback.
//! - **[`event`]**: lifecycle events (`PluginLoaded`, `PluginUnloaded`,
//!   `CycleDetected`, ...) dispatched to host-registered handlers.
//! - **[`engine`]**: the orchestrator tying the above together behind
//!   generation-tagged immutable snapshots and the host query API.

pub mod assets;
pub mod engine;
pub mod event;
pub mod loader;
pub mod manifest;
pub mod patch;
pub mod resolver;

// Re-export key public types for the binary and for plugins.
pub use assets::{AssetIndex, AssetResolution};
pub use engine::{EngineConfig, Error, LoadReport, ModEngine, Result, Snapshot};
pub use event::{Event, EventDispatcher, EngineEvent};
pub use loader::{Plugin, PluginContext, PluginError, PluginRegistry};
pub use manifest::{DependencyRef, PluginManifest, VersionRange};
pub use patch::{HookTransform, PatchKind, PatchManager, PatchOrdering, PatchSession};
pub use resolver::{DependencyGraph, Diagnostic, LoadOrderResult, Severity};
