//! Dynamic-library plugin loading.
//!
//! A dylib plugin exports [`PLUGIN_ENTRY_SYMBOL`], a no-argument function
//! returning `Box<dyn Plugin>`. Every crossing into plugin code at load
//! time is wrapped in `catch_unwind` so one plugin's panic cannot take the
//! host down.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use libloading::{Library, Symbol};
use log::debug;

use crate::loader::error::LoaderError;
use crate::loader::traits::{Plugin, PluginContext, PluginError};
use crate::manifest::PluginManifest;

/// Symbol a plugin library must export.
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"modforge_plugin_entry";

/// Signature of the exported entry function.
pub type PluginEntryFn = unsafe fn() -> Box<dyn Plugin>;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic reason".to_string()
    }
}

/// Wrapper keeping the backing library alive for as long as the plugin
/// instance is. `inner` is declared first so it drops before the library.
struct DylibPlugin {
    inner: Box<dyn Plugin>,
    _library: Library,
}

#[async_trait]
impl Plugin for DylibPlugin {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn version(&self) -> &str {
        self.inner.version()
    }

    async fn init(&self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        // Panics inside async init are contained by the loader's task
        // boundary; no extra guard needed here.
        self.inner.init(ctx).await
    }

    fn shutdown(&self) -> Result<(), PluginError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.shutdown())) {
            Ok(result) => result,
            Err(payload) => Err(PluginError::Shutdown(format!(
                "panic: {}",
                panic_message(payload)
            ))),
        }
    }
}

/// Loads the plugin instance declared by `manifest.entry_point`.
///
/// The entry point was validated at parse time to be a plain relative path
/// inside the plugin directory.
pub fn load_dylib_plugin(manifest: &PluginManifest) -> Result<Arc<dyn Plugin>, LoaderError> {
    let entry_name = manifest
        .entry_point
        .as_deref()
        .ok_or_else(|| LoaderError::NoEntryPoint {
            plugin_id: manifest.id.clone(),
        })?;
    let library_path = manifest.base_dir.join(entry_name);

    debug!(
        "loading plugin '{}' from '{}'",
        manifest.id,
        library_path.display()
    );

    let library = unsafe { Library::new(&library_path) }.map_err(|e| LoaderError::Library {
        plugin_id: manifest.id.clone(),
        path: library_path.clone(),
        message: e.to_string(),
    })?;

    let entry: Symbol<PluginEntryFn> =
        unsafe { library.get(PLUGIN_ENTRY_SYMBOL) }.map_err(|e| LoaderError::Library {
            plugin_id: manifest.id.clone(),
            path: library_path.clone(),
            message: format!("missing symbol 'modforge_plugin_entry': {}", e),
        })?;
    let entry_fn: PluginEntryFn = *entry;

    let inner = panic::catch_unwind(AssertUnwindSafe(|| unsafe { entry_fn() })).map_err(
        |payload| LoaderError::EntryPanic {
            plugin_id: manifest.id.clone(),
            message: panic_message(payload),
        },
    )?;

    if inner.id() != manifest.id {
        return Err(LoaderError::IdentityMismatch {
            manifest_id: manifest.id.clone(),
            instance_id: inner.id().to_string(),
        });
    }

    Ok(Arc::new(DylibPlugin {
        inner,
        _library: library,
    }))
}
