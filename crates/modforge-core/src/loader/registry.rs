use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::loader::error::LoaderError;
use crate::loader::traits::Plugin;

/// Registry of live plugin instances.
///
/// Instances are shared (`Arc`) because initialization runs on spawned
/// tasks; the registry itself tracks which of them completed their
/// initialization hook this generation.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    initialized: HashSet<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin instance under its own id.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), LoaderError> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(LoaderError::AlreadyRegistered { plugin_id: id });
        }
        self.plugins.insert(id, plugin);
        Ok(())
    }

    /// Removes and returns a plugin instance.
    pub fn unregister(&mut self, id: &str) -> Result<Arc<dyn Plugin>, LoaderError> {
        self.initialized.remove(id);
        self.plugins
            .remove(id)
            .ok_or_else(|| LoaderError::NotRegistered {
                plugin_id: id.to_string(),
            })
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(id).cloned()
    }

    pub fn mark_initialized(&mut self, id: &str) {
        self.initialized.insert(id.to_string());
    }

    pub fn is_initialized(&self, id: &str) -> bool {
        self.initialized.contains(id)
    }

    /// Ids of all registered plugins, sorted.
    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn initialized_count(&self) -> usize {
        self.initialized.len()
    }
}
