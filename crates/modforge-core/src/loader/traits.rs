use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::patch::PatchSession;

/// Error a plugin reports from its lifecycle hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin initialization error: {0}")]
    Init(String),

    #[error("plugin execution error: {0}")]
    Execution(String),

    #[error("plugin shutdown error: {0}")]
    Shutdown(String),
}

/// Context a plugin receives while its initialization hook runs.
///
/// The patch session is the only sanctioned way for the plugin to modify
/// host behavior; everything applied through it is attributed to this
/// plugin and revoked when it unloads.
pub struct PluginContext {
    session: PatchSession,
    loaded_before: Arc<Vec<String>>,
}

impl PluginContext {
    pub(crate) fn new(session: PatchSession, loaded_before: Arc<Vec<String>>) -> Self {
        Self {
            session,
            loaded_before,
        }
    }

    /// The plugin's modification session.
    pub fn patches(&mut self) -> &mut PatchSession {
        &mut self.session
    }

    /// Ids of plugins that already initialized this generation, in load
    /// order. Earlier plugins have registered their capabilities by now.
    pub fn loaded_before(&self) -> &[String] {
        &self.loaded_before
    }
}

/// Core trait every plugin implements.
///
/// Implementations are either linked into the host and registered
/// statically, or exported from a dynamic library through
/// [`PLUGIN_ENTRY_SYMBOL`](crate::loader::dynamic::PLUGIN_ENTRY_SYMBOL).
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The plugin's id; must match its manifest.
    fn id(&self) -> &str;

    /// The plugin's version string.
    fn version(&self) -> &str;

    /// Initialization hook, invoked once in resolved load order under a
    /// bounded time budget. Applying patches through `ctx` is only valid
    /// here.
    async fn init(&self, ctx: &mut PluginContext) -> Result<(), PluginError>;

    /// Shutdown hook, invoked on unload in reverse load order.
    fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
