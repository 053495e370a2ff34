//! Error types for plugin instantiation and lifecycle management.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("plugin '{plugin_id}' is already registered")]
    AlreadyRegistered { plugin_id: String },

    #[error("plugin '{plugin_id}' is not registered")]
    NotRegistered { plugin_id: String },

    #[error("failed to load plugin library for '{plugin_id}' from '{}': {message}", path.display())]
    Library {
        plugin_id: String,
        path: PathBuf,
        message: String,
    },

    #[error("plugin '{plugin_id}' declares no entry point and has no built-in registration")]
    NoEntryPoint { plugin_id: String },

    #[error("dynamic plugin loading is disabled; cannot load '{plugin_id}'")]
    DynamicLoadingDisabled { plugin_id: String },

    #[error("plugin entry for '{plugin_id}' panicked: {message}")]
    EntryPanic { plugin_id: String, message: String },

    #[error("manifest '{manifest_id}' resolved to a plugin identifying as '{instance_id}'")]
    IdentityMismatch {
        manifest_id: String,
        instance_id: String,
    },
}
