//! The engine orchestrator.
//!
//! [`ModEngine`] drives the whole pipeline — discover, graph, resolve,
//! load, index — and publishes the result as a generation-tagged immutable
//! [`Snapshot`]. It also answers the host query API: load order,
//! diagnostics, asset resolution, modification chains, and unloading.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::assets::{AssetIndex, AssetResolution};
use crate::engine::config::EngineConfig;
use crate::engine::error::{Error, Result};
use crate::engine::snapshot::Snapshot;
use crate::event::{EngineEvent, Event, EventDispatcher};
use crate::loader::{LoadOptions, PluginLoader, PluginRegistry};
use crate::loader::error::LoaderError;
use crate::loader::traits::Plugin;
use crate::manifest::{discovery, PluginManifest};
use crate::patch::{HookTransform, PatchManager};
use crate::resolver::{resolve, DependencyGraph, Diagnostic, Severity};

/// Complete account of one load attempt, handed to the host so a UI or CLI
/// can present an actionable summary rather than a single stack trace.
#[derive(Debug)]
pub struct LoadReport {
    pub generation: u64,
    /// Plugins that loaded, in load order.
    pub loaded: Vec<String>,
    /// Every problem found during the attempt.
    pub diagnostics: Vec<Diagnostic>,
    /// The attempt was cancelled; nothing from it remains loaded.
    pub cancelled: bool,
    /// A global invariant was violated (duplicate ids); the whole load was
    /// aborted and no plugin was touched.
    pub aborted: bool,
}

impl LoadReport {
    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.iter().any(|p| p == id)
    }

    pub fn fatal_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Fatal)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }
}

/// Result of a dry-run resolution (no plugin code executed).
#[derive(Debug)]
pub struct CheckReport {
    pub order: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub aborted: bool,
}

/// The plugin engine.
///
/// All published state lives behind generation-tagged snapshots; a reload
/// swaps generations atomically and readers never observe a partial update.
pub struct ModEngine {
    config: EngineConfig,
    loader: PluginLoader,
    /// Manifests for statically registered plugins, merged with on-disk
    /// discovery on every load.
    builtin_manifests: Vec<PluginManifest>,
    registry: Mutex<PluginRegistry>,
    patches: PatchManager,
    dispatcher: Arc<Mutex<EventDispatcher>>,
    snapshot: RwLock<Arc<Snapshot>>,
    manifests: Mutex<HashMap<String, PluginManifest>>,
    cancel: AtomicBool,
    next_generation: AtomicU64,
}

impl ModEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loader: PluginLoader::new(),
            builtin_manifests: Vec::new(),
            registry: Mutex::new(PluginRegistry::new()),
            patches: PatchManager::new(),
            dispatcher: Arc::new(Mutex::new(EventDispatcher::new())),
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            manifests: Mutex::new(HashMap::new()),
            cancel: AtomicBool::new(false),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The event dispatcher, for host handler registration.
    pub fn dispatcher(&self) -> Arc<Mutex<EventDispatcher>> {
        Arc::clone(&self.dispatcher)
    }

    /// Registers a statically linked plugin together with its manifest.
    /// Must be called before [`load_all`](Self::load_all).
    pub fn register_builtin(
        &mut self,
        manifest: PluginManifest,
        plugin: Arc<dyn Plugin>,
    ) -> Result<()> {
        if plugin.id() != manifest.id {
            return Err(Error::Loader(LoaderError::IdentityMismatch {
                manifest_id: manifest.id,
                instance_id: plugin.id().to_string(),
            }));
        }
        self.loader.register_builtin(plugin)?;
        self.builtin_manifests.push(manifest);
        Ok(())
    }

    /// Requests cancellation of an in-progress load. Plugins that already
    /// completed their patch sessions are rolled back, never leaked.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    async fn assemble(&self) -> (Vec<PluginManifest>, Vec<Diagnostic>) {
        let mut manifests = self.builtin_manifests.clone();
        let discovered = discovery::discover(&self.config.plugin_dirs).await;
        manifests.extend(discovered.manifests);
        (manifests, discovered.diagnostics)
    }

    /// Resolves the load order without executing any plugin code.
    pub async fn check(&self) -> CheckReport {
        let (manifests, mut diagnostics) = self.assemble().await;
        let (graph, graph_diagnostics) = DependencyGraph::build(&manifests);
        diagnostics.extend(graph_diagnostics);

        if diagnostics.iter().any(Diagnostic::is_global_fatal) {
            return CheckReport {
                order: Vec::new(),
                diagnostics,
                aborted: true,
            };
        }

        let resolution = resolve(&graph);
        diagnostics.extend(resolution.diagnostics);
        CheckReport {
            order: resolution.order,
            diagnostics,
            aborted: false,
        }
    }

    /// Runs the full pipeline and publishes a new generation.
    ///
    /// Failures are isolated to the smallest affected subgraph; only a
    /// violated global invariant (duplicate ids) aborts the entire load.
    pub async fn load_all(&self) -> LoadReport {
        self.cancel.store(false, Ordering::SeqCst);

        let (all_manifests, mut diagnostics) = self.assemble().await;
        info!(
            "load started: {} manifest(s) from {} root(s) + {} builtin(s)",
            all_manifests.len(),
            self.config.plugin_dirs.len(),
            self.builtin_manifests.len()
        );

        let (graph, graph_diagnostics) = DependencyGraph::build(&all_manifests);
        diagnostics.extend(graph_diagnostics);

        if diagnostics.iter().any(Diagnostic::is_global_fatal) {
            error!("load aborted: duplicate plugin ids make identity ambiguous");
            return LoadReport {
                generation: self.snapshot.read().await.generation,
                loaded: Vec::new(),
                diagnostics,
                cancelled: false,
                aborted: true,
            };
        }

        let resolution = resolve(&graph);
        for diagnostic in &resolution.diagnostics {
            if let Diagnostic::CircularDependency { path } = diagnostic {
                self.emit(EngineEvent::CycleDetected { path: path.clone() })
                    .await;
            }
        }
        diagnostics.extend(resolution.diagnostics);

        // First declaration wins for lookups; duplicates were fatal above.
        let mut manifest_map: HashMap<String, PluginManifest> = HashMap::new();
        for manifest in all_manifests {
            manifest_map
                .entry(manifest.id.clone())
                .or_insert(manifest);
        }

        let options = LoadOptions {
            init_budget: self.config.init_budget(),
            allow_dylibs: self.config.allow_dylibs,
        };

        let outcome = {
            let mut registry = self.registry.lock().await;
            self.loader
                .load_all(
                    &resolution.order,
                    &manifest_map,
                    &mut registry,
                    &self.patches,
                    &options,
                    &self.cancel,
                )
                .await
        };

        for id in &outcome.loaded {
            self.emit(EngineEvent::PluginLoaded { id: id.clone() }).await;
        }
        diagnostics.extend(outcome.diagnostics);
        diagnostics.extend(self.patches.take_conflicts().await);

        // One failure event per plugin that cannot load, whether it was
        // excluded during resolution or failed at runtime.
        for diagnostic in &diagnostics {
            if diagnostic.severity() == Severity::Fatal {
                if let Some(id) = diagnostic.plugin_id() {
                    self.emit(EngineEvent::PluginLoadFailed {
                        id: id.to_string(),
                        reason: diagnostic.to_string(),
                    })
                    .await;
                }
            }
        }

        let assets = AssetIndex::build(
            &outcome.loaded,
            &manifest_map,
            self.config.base_asset_dir.as_deref(),
        );

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            generation,
            load_order: outcome.loaded.clone(),
            diagnostics: diagnostics.clone(),
            assets,
        });
        *self.snapshot.write().await = Arc::clone(&snapshot);
        *self.manifests.lock().await = manifest_map;
        self.emit(EngineEvent::GenerationSwapped { generation }).await;

        info!(
            "generation {} published: {} plugin(s) loaded, {} diagnostic(s)",
            generation,
            snapshot.load_order.len(),
            snapshot.diagnostics.len()
        );

        LoadReport {
            generation,
            loaded: outcome.loaded,
            diagnostics,
            cancelled: outcome.cancelled,
            aborted: false,
        }
    }

    /// The current generation's snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Ids of loaded plugins, in load order.
    pub async fn load_order(&self) -> Vec<String> {
        self.snapshot.read().await.load_order.clone()
    }

    /// Diagnostics of the current generation.
    pub async fn diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot.read().await.diagnostics.clone()
    }

    /// Resolves which provider owns the resource at `logical_path`.
    pub async fn resolve_asset(&self, logical_path: &str) -> AssetResolution {
        self.snapshot.read().await.assets.resolve(logical_path)
    }

    /// The plugins modifying `target`, in chain order.
    pub async fn modification_chain(&self, target: &str) -> Vec<String> {
        self.patches.modification_chain(target).await
    }

    /// The transforms for `target` in final order, for the host to install.
    pub async fn chain_transforms(&self, target: &str) -> Vec<(String, Arc<dyn HookTransform>)> {
        self.patches.chain_transforms(target).await
    }

    pub async fn is_loaded(&self, id: &str) -> bool {
        let registry = self.registry.lock().await;
        registry.is_initialized(id)
    }

    /// Unloads a single plugin: runs its shutdown hook, revokes exactly its
    /// patch records, and publishes a new generation without its assets.
    pub async fn unload_plugin(&self, id: &str) -> Result<()> {
        let plugin = {
            let mut registry = self.registry.lock().await;
            registry.unregister(id)?
        };
        if let Err(e) = plugin.shutdown() {
            warn!("error shutting down plugin '{}': {}", id, e);
        }

        let revoked = self.patches.end_session(id).await;
        debug!("unloaded '{}', revoked {} patch record(s)", id, revoked);

        let snapshot = {
            let current = self.snapshot.read().await.clone();
            let order: Vec<String> = current
                .load_order
                .iter()
                .filter(|p| p.as_str() != id)
                .cloned()
                .collect();

            let manifests = self.manifests.lock().await;
            for remaining in &order {
                if let Some(manifest) = manifests.get(remaining) {
                    if manifest.requires.iter().any(|dep| dep.id == id) {
                        warn!(
                            "plugin '{}' remains loaded but required '{}', which was just unloaded",
                            remaining, id
                        );
                    }
                }
            }

            let assets =
                AssetIndex::build(&order, &manifests, self.config.base_asset_dir.as_deref());
            let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
            Arc::new(Snapshot {
                generation,
                load_order: order,
                diagnostics: current.diagnostics.clone(),
                assets,
            })
        };

        let generation = snapshot.generation;
        *self.snapshot.write().await = snapshot;
        self.emit(EngineEvent::PluginUnloaded { id: id.to_string() })
            .await;
        self.emit(EngineEvent::GenerationSwapped { generation }).await;
        Ok(())
    }

    /// Unloads everything in reverse load order and publishes the empty
    /// generation. Errors from individual shutdown hooks are collected, not
    /// allowed to stop the teardown.
    pub async fn shutdown_all(&self) -> Result<()> {
        let order = self.snapshot.read().await.load_order.clone();
        let mut shutdown_errors = Vec::new();

        {
            let mut registry = self.registry.lock().await;
            for id in order.iter().rev() {
                match registry.unregister(id) {
                    Ok(plugin) => {
                        if let Err(e) = plugin.shutdown() {
                            let message = format!("error shutting down plugin '{}': {}", id, e);
                            warn!("{}", message);
                            shutdown_errors.push(message);
                        }
                    }
                    Err(e) => warn!("shutdown: {}", e),
                }
                self.patches.end_session(id).await;
                self.emit(EngineEvent::PluginUnloaded { id: id.clone() })
                    .await;
            }
        }

        // No session may survive a full shutdown, including sessions of
        // plugins that never made it into a published load order.
        self.patches.end_all_sessions().await;

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.snapshot.write().await = Arc::new(Snapshot {
            generation,
            load_order: Vec::new(),
            diagnostics: Vec::new(),
            assets: AssetIndex::default(),
        });
        self.emit(EngineEvent::GenerationSwapped { generation }).await;

        if shutdown_errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "encountered errors during plugin shutdown: {}",
                shutdown_errors.join("; ")
            )))
        }
    }

    async fn emit(&self, event: EngineEvent) {
        debug!("event: {}", event.name());
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.dispatch(&event).await;
    }
}
