//! Error types for manifest parsing and version range handling.

use std::path::PathBuf;
use thiserror::Error;

/// Error produced while parsing a version range expression.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("comparator '{token}' is missing a version")]
    MissingVersion { token: String },

    #[error("comparator '{token}' has an invalid version: {source}")]
    InvalidVersion {
        token: String,
        #[source]
        source: semver::Error,
    },
}

/// Error produced while reading or parsing a plugin manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest '{}' is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest '{}': field '{field}' must not be empty", path.display())]
    EmptyField { path: PathBuf, field: &'static str },

    #[error("manifest '{}': invalid version '{value}': {source}", path.display())]
    InvalidVersion {
        path: PathBuf,
        value: String,
        #[source]
        source: semver::Error,
    },

    #[error(
        "manifest '{}': invalid version range '{value}' for dependency '{dependency}': {source}",
        path.display()
    )]
    InvalidRange {
        path: PathBuf,
        dependency: String,
        value: String,
        #[source]
        source: RangeError,
    },

    #[error(
        "manifest '{}': entry point '{value}' must be relative and must not traverse upwards",
        path.display()
    )]
    InvalidEntryPoint { path: PathBuf, value: String },

    #[error(
        "manifest '{}': asset file '{value}' must be relative and must not traverse upwards",
        path.display()
    )]
    InvalidAssetPath { path: PathBuf, value: String },
}
