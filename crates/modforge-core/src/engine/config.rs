//! Engine configuration.
//!
//! Loaded from a `modforge.toml` (or `.yaml`/`.yml` with the `yaml-config`
//! feature) file; every field has a sensible default so a missing config
//! file is not an error for embedders that configure in code.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "toml-config")]
    #[error("failed to parse TOML config '{}': {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[cfg(feature = "yaml-config")]
    #[error("failed to parse YAML config '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported config format: '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Settings controlling discovery, loading, and asset fallback.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Directories scanned for plugin packages.
    pub plugin_dirs: Vec<PathBuf>,
    /// Host base content used as the asset fallback of last resort.
    pub base_asset_dir: Option<PathBuf>,
    /// Per-plugin initialization time budget, in milliseconds.
    pub init_timeout_ms: u64,
    /// Whether manifests may name dynamic-library entry points.
    pub allow_dylibs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plugin_dirs: vec![PathBuf::from("mods")],
            base_asset_dir: None,
            init_timeout_ms: 5_000,
            allow_dylibs: true,
        }
    }
}

impl EngineConfig {
    /// The initialization budget as a [`Duration`].
    pub fn init_budget(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// Loads configuration from a file, dispatching on the extension.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match extension.as_str() {
            #[cfg(feature = "toml-config")]
            "toml" => toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
