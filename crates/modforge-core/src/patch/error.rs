//! Error types for the patch isolation manager.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("no active patch session for plugin '{0}'")]
    NoActiveSession(String),

    #[error("a patch session is already active for plugin '{0}'")]
    SessionAlreadyActive(String),

    #[error("ordering conflict on target '{target}' for plugin '{plugin}': {detail}")]
    OrderingConflict {
        plugin: String,
        target: String,
        detail: String,
    },
}
