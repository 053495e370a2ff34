//! Structured diagnostics collected across a load attempt.
//!
//! Diagnostics are accumulated, never thrown-and-abandoned: a single load
//! attempt reports every problem found so an operator can fix them all at
//! once instead of replaying the load one failure at a time.

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

use crate::manifest::VersionRange;

/// How severe a diagnostic is for the plugin it is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The plugin still loads; something is worth telling the operator.
    Warning,
    /// The plugin (at least) does not load.
    Fatal,
}

/// One problem found while parsing, resolving, or loading plugins.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("failed to parse manifest '{}': {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    #[error(
        "duplicate plugin id '{id}' declared by '{}' and '{}'",
        first.display(),
        second.display()
    )]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("plugin '{id}' depends on itself")]
    SelfDependency { id: String },

    #[error(
        "plugin '{dependent}' requires '{required}' (version {range}) but found {found_desc}",
        found_desc = found.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "no such plugin".to_string())
    )]
    MissingOrIncompatibleDependency {
        dependent: String,
        required: String,
        range: VersionRange,
        found: Option<Version>,
    },

    #[error("plugin '{dependent}' excluded because its dependency '{via}' cannot load")]
    TransitiveDependencyFailure { dependent: String, via: String },

    #[error(
        "optional dependency '{optional}' of plugin '{dependent}' is {found_desc}; ordering hint ignored",
        found_desc = found.as_ref().map(|v| format!("present at incompatible version {v}")).unwrap_or_else(|| "absent".to_string())
    )]
    OptionalDependencyMissing {
        dependent: String,
        optional: String,
        found: Option<Version>,
    },

    #[error("circular dependency detected: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("plugin '{id}' failed to initialize: {reason}")]
    InitializationFailure { id: String, reason: String },

    #[error("plugin '{id}' exceeded its initialization time budget")]
    InitializationTimeout { id: String },

    #[error("plugin '{id}' skipped: required dependency '{root_cause}' failed to load")]
    CascadeFailure { id: String, root_cause: String },

    #[error("patch ordering conflict for plugin '{plugin}' on target '{target}': {detail}")]
    PatchOrderingConflict {
        plugin: String,
        target: String,
        detail: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::OptionalDependencyMissing { .. }
            | Diagnostic::PatchOrderingConflict { .. } => Severity::Warning,
            _ => Severity::Fatal,
        }
    }

    /// Whether this diagnostic invalidates the entire load, not just one
    /// plugin. Ambiguous identity means no ordering can be trusted.
    pub fn is_global_fatal(&self) -> bool {
        matches!(self, Diagnostic::DuplicateId { .. })
    }

    /// The plugin this diagnostic is charged to, when there is exactly one.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Diagnostic::ParseFailure { .. } | Diagnostic::CircularDependency { .. } => None,
            Diagnostic::DuplicateId { id, .. }
            | Diagnostic::SelfDependency { id }
            | Diagnostic::InitializationFailure { id, .. }
            | Diagnostic::InitializationTimeout { id }
            | Diagnostic::CascadeFailure { id, .. } => Some(id),
            Diagnostic::MissingOrIncompatibleDependency { dependent, .. }
            | Diagnostic::TransitiveDependencyFailure { dependent, .. }
            | Diagnostic::OptionalDependencyMissing { dependent, .. } => Some(dependent),
            Diagnostic::PatchOrderingConflict { plugin, .. } => Some(plugin),
        }
    }
}
