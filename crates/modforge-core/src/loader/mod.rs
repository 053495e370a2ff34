//! # Plugin Loading
//!
//! Loads plugins strictly in resolved order, one at a time, with a
//! per-plugin error boundary: an initialization failure, panic, or timeout
//! is recorded against that plugin alone, its patch session is revoked, and
//! loading continues with everything that did not require it.
//!
//! - **[`traits`]**: the [`Plugin`] trait and the context handed to
//!   initialization hooks.
//! - **[`registry`]**: live plugin instances keyed by id.
//! - **[`dynamic`]**: dynamic-library loading with panic containment.

pub mod dynamic;
pub mod error;
pub mod registry;
pub mod traits;

pub use error::LoaderError;
pub use registry::PluginRegistry;
pub use traits::{Plugin, PluginContext, PluginError};


use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::time::timeout;

use crate::loader::dynamic::panic_message;
use crate::manifest::PluginManifest;
use crate::patch::PatchManager;
use crate::resolver::Diagnostic;

/// Knobs for a load pass.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Time budget for each plugin's initialization hook.
    pub init_budget: Duration,
    /// Whether manifests may name dynamic-library entry points.
    pub allow_dylibs: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            init_budget: Duration::from_secs(5),
            allow_dylibs: true,
        }
    }
}

/// What a load pass produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Plugins that initialized successfully, in load order.
    pub loaded: Vec<String>,
    /// One diagnostic per plugin that failed or was skipped.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the pass was cancelled before completing. A cancelled pass
    /// rolls back: sessions of already-loaded plugins are revoked.
    pub cancelled: bool,
}

/// Instantiates plugins and runs their initialization hooks.
#[derive(Default)]
pub struct PluginLoader {
    /// Statically registered instances; these take precedence over any
    /// dynamic entry point the manifest declares.
    builtin: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a statically linked plugin instance.
    pub fn register_builtin(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), LoaderError> {
        let id = plugin.id().to_string();
        if self.builtin.contains_key(&id) {
            return Err(LoaderError::AlreadyRegistered { plugin_id: id });
        }
        self.builtin.insert(id, plugin);
        Ok(())
    }

    pub fn has_builtin(&self, id: &str) -> bool {
        self.builtin.contains_key(id)
    }

    fn instantiate(
        &self,
        manifest: &PluginManifest,
        options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, LoaderError> {
        if let Some(plugin) = self.builtin.get(&manifest.id) {
            return Ok(Arc::clone(plugin));
        }
        if manifest.entry_point.is_none() {
            return Err(LoaderError::NoEntryPoint {
                plugin_id: manifest.id.clone(),
            });
        }
        if !options.allow_dylibs {
            return Err(LoaderError::DynamicLoadingDisabled {
                plugin_id: manifest.id.clone(),
            });
        }
        dynamic::load_dylib_plugin(manifest)
    }

    /// Loads every plugin in `order`, sequentially.
    ///
    /// Reordering here would invalidate the resolver's guarantees: later
    /// plugins may assume earlier ones have registered their capabilities.
    /// A plugin whose *required* dependency failed at runtime is skipped
    /// with a diagnostic naming the root cause; optional dependents still
    /// load.
    pub async fn load_all(
        &self,
        order: &[String],
        manifests: &HashMap<String, PluginManifest>,
        registry: &mut PluginRegistry,
        patches: &PatchManager,
        options: &LoadOptions,
        cancel: &AtomicBool,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        // Failed or skipped plugin -> the plugin at the root of the failure.
        let mut failed_root: HashMap<String, String> = HashMap::new();

        for id in order {
            if cancel.load(Ordering::SeqCst) {
                warn!("load cancelled before '{}'; rolling back this generation", id);
                self.rollback(&outcome.loaded, registry, patches).await;
                outcome.loaded.clear();
                outcome.cancelled = true;
                return outcome;
            }

            let Some(manifest) = manifests.get(id) else {
                error!("no manifest for resolved plugin '{}'", id);
                outcome.diagnostics.push(Diagnostic::InitializationFailure {
                    id: id.clone(),
                    reason: "manifest missing from resolved set".to_string(),
                });
                failed_root.insert(id.clone(), id.clone());
                continue;
            };

            // Runtime cascade: declared compatibility was already checked,
            // but a required dependency may still have failed to *become
            // ready*. Both cascades must behave identically.
            if let Some(root) = manifest
                .requires
                .iter()
                .find_map(|dep| failed_root.get(&dep.id))
            {
                let root = root.clone();
                warn!(
                    "skipping '{}': required dependency chain failed at '{}'",
                    id, root
                );
                outcome.diagnostics.push(Diagnostic::CascadeFailure {
                    id: id.clone(),
                    root_cause: root.clone(),
                });
                failed_root.insert(id.clone(), root);
                continue;
            }

            let plugin = match self.instantiate(manifest, options) {
                Ok(plugin) => plugin,
                Err(e) => {
                    outcome.diagnostics.push(Diagnostic::InitializationFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                    failed_root.insert(id.clone(), id.clone());
                    continue;
                }
            };

            if let Err(e) = registry.register(Arc::clone(&plugin)) {
                outcome.diagnostics.push(Diagnostic::InitializationFailure {
                    id: id.clone(),
                    reason: e.to_string(),
                });
                failed_root.insert(id.clone(), id.clone());
                continue;
            }

            let session = match patches.begin_session(id, outcome.loaded.len()).await {
                Ok(session) => session,
                Err(e) => {
                    outcome.diagnostics.push(Diagnostic::InitializationFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                    failed_root.insert(id.clone(), id.clone());
                    let _ = registry.unregister(id);
                    continue;
                }
            };

            // Run the hook on its own task: the task boundary both contains
            // panics and gives the timeout something it can actually abort.
            let loaded_so_far = Arc::new(outcome.loaded.clone());
            let task_plugin = Arc::clone(&plugin);
            let mut handle = tokio::spawn(async move {
                let mut ctx = PluginContext::new(session, loaded_so_far);
                task_plugin.init(&mut ctx).await
            });

            let failure = match timeout(options.init_budget, &mut handle).await {
                Err(_elapsed) => {
                    handle.abort();
                    // Wait for the cancellation to land so the session can
                    // be revoked without racing a half-finished hook.
                    let _ = handle.await;
                    Some(Diagnostic::InitializationTimeout { id: id.clone() })
                }
                Ok(Err(join_err)) => {
                    let reason = if join_err.is_panic() {
                        format!("panic: {}", panic_message(join_err.into_panic()))
                    } else {
                        "initialization task was aborted".to_string()
                    };
                    Some(Diagnostic::InitializationFailure {
                        id: id.clone(),
                        reason,
                    })
                }
                Ok(Ok(Err(plugin_err))) => Some(Diagnostic::InitializationFailure {
                    id: id.clone(),
                    reason: plugin_err.to_string(),
                }),
                Ok(Ok(Ok(()))) => None,
            };

            match failure {
                Some(diagnostic) => {
                    error!("{}", diagnostic);
                    outcome.diagnostics.push(diagnostic);
                    failed_root.insert(id.clone(), id.clone());
                    patches.end_session(id).await;
                    let _ = registry.unregister(id);
                }
                None => {
                    registry.mark_initialized(id);
                    info!("plugin '{}' initialized", id);
                    outcome.loaded.push(id.clone());
                }
            }
        }

        outcome
    }

    /// Reverts a partially completed generation: shuts plugins down in
    /// reverse order and revokes their sessions, so a cancelled load leaks
    /// no modifications.
    async fn rollback(
        &self,
        loaded: &[String],
        registry: &mut PluginRegistry,
        patches: &PatchManager,
    ) {
        for id in loaded.iter().rev() {
            if let Some(plugin) = registry.get(id) {
                if let Err(e) = plugin.shutdown() {
                    warn!("error shutting down '{}' during rollback: {}", id, e);
                }
            }
            patches.end_session(id).await;
            let _ = registry.unregister(id);
        }
    }
}
