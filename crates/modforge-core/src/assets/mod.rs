//! # Asset Override Resolution
//!
//! Answers "which plugin provides the resource at logical path P?" using
//! reverse-load-order priority: the last-loaded plugin declaring a path
//! wins, host-provided base content is the fallback of last resort.
//!
//! The index is a pure query structure built once after loading completes
//! and rebuilt wholesale on reload; nothing mutates it in between.


use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::warn;

use crate::manifest::PluginManifest;

/// One plugin's claim on a logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOverrideEntry {
    pub logical_path: String,
    pub plugin_id: String,
    pub location: PathBuf,
}

/// Outcome of resolving a logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResolution {
    /// A plugin provides the resource.
    Plugin { plugin_id: String, location: PathBuf },
    /// No plugin declares it; host base content has it.
    Base { location: PathBuf },
    NotFound,
}

/// Immutable index from logical paths to their providers.
#[derive(Debug, Default)]
pub struct AssetIndex {
    /// Entries per logical path, in load order; the last entry is active.
    overrides: HashMap<String, Vec<AssetOverrideEntry>>,
    /// Host-provided base content, keyed by relative path.
    base: HashMap<String, PathBuf>,
}

impl AssetIndex {
    /// Builds the index for a completed load.
    ///
    /// `order` holds the ids of successfully loaded plugins in load order;
    /// `base_dir`, when set, is scanned for host fallback content.
    pub fn build(
        order: &[String],
        manifests: &HashMap<String, PluginManifest>,
        base_dir: Option<&Path>,
    ) -> Self {
        let mut index = AssetIndex::default();

        if let Some(dir) = base_dir {
            scan_base(dir, dir, &mut index.base);
        }

        for id in order {
            let Some(manifest) = manifests.get(id) else {
                warn!("no manifest for loaded plugin '{}'; assets skipped", id);
                continue;
            };
            for decl in &manifest.assets {
                index
                    .overrides
                    .entry(decl.path.clone())
                    .or_default()
                    .push(AssetOverrideEntry {
                        logical_path: decl.path.clone(),
                        plugin_id: id.clone(),
                        location: manifest.base_dir.join(&decl.file),
                    });
            }
        }

        index
    }

    /// Resolves a logical path: most-recently-loaded provider first, then
    /// base content, then `NotFound`.
    pub fn resolve(&self, logical_path: &str) -> AssetResolution {
        if let Some(entry) = self
            .overrides
            .get(logical_path)
            .and_then(|entries| entries.last())
        {
            return AssetResolution::Plugin {
                plugin_id: entry.plugin_id.clone(),
                location: entry.location.clone(),
            };
        }
        if let Some(location) = self.base.get(logical_path) {
            return AssetResolution::Base {
                location: location.clone(),
            };
        }
        AssetResolution::NotFound
    }

    /// The id of the plugin whose entry is active for `logical_path`.
    pub fn provider(&self, logical_path: &str) -> Option<&str> {
        self.overrides
            .get(logical_path)
            .and_then(|entries| entries.last())
            .map(|entry| entry.plugin_id.as_str())
    }

    /// Every plugin declaring `logical_path`, in load order.
    pub fn providers(&self, logical_path: &str) -> Vec<&str> {
        self.overrides
            .get(logical_path)
            .map(|entries| entries.iter().map(|e| e.plugin_id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Number of distinct logical paths with at least one plugin override.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

/// Collects base content files relative to `root`, with `/` separators so
/// keys match logical paths regardless of platform.
fn scan_base(root: &Path, dir: &Path, out: &mut HashMap<String, PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("could not read base content dir '{}': {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_base(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.insert(key, path);
        }
    }
}
