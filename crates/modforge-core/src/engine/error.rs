//! # Engine Errors
//!
//! The crate-level error type aggregating each subsystem's typed errors,
//! plus the `Result` alias used across the engine's public API.

use thiserror::Error as ThisError;

use crate::engine::config::ConfigError;
use crate::loader::error::LoaderError;
use crate::manifest::error::ManifestError;
use crate::patch::error::PatchError;

/// Top-level error type for the ModForge engine.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("patch system error: {0}")]
    Patch(#[from] PatchError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Shorthand for Result with the engine error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
