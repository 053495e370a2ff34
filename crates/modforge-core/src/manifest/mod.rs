//! # Plugin Manifests
//!
//! The declarative description of a plugin: identity, version, dependency
//! constraints, ordering hints, priority, and asset overrides. Manifests are
//! parsed once at discovery time and are immutable thereafter; everything
//! downstream (graph building, resolution, loading) works from the records
//! produced here.
//!
//! On disk a manifest is a `manifest.json` file at the root of the plugin's
//! directory. Field names are camelCase (`displayName`, `loadAfter`,
//! `versionRange`, ...); see [`PluginManifest::parse_str`].

use std::fmt;
use std::path::{Component, Path, PathBuf};

use semver::Version;
use serde::Deserialize;

pub mod discovery;
pub mod error;
pub mod version;

pub use error::{ManifestError, RangeError};
pub use version::{RangeOp, VersionRange};

#[cfg(test)]
mod tests;

/// Name of the manifest file looked for in each plugin directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A dependency of one plugin on another, with an acceptable version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    /// Id of the target plugin.
    pub id: String,
    /// Versions of the target that are acceptable. The empty range accepts
    /// any version.
    pub range: VersionRange,
}

impl DependencyRef {
    /// A dependency on any version of `id`.
    pub fn any(id: &str) -> Self {
        Self {
            id: id.to_string(),
            range: VersionRange::any(),
        }
    }

    /// A dependency on `id` constrained to `range`.
    pub fn with_range(id: &str, range: VersionRange) -> Self {
        Self {
            id: id.to_string(),
            range,
        }
    }

    /// Whether the given installed version satisfies this reference.
    pub fn compatible_with(&self, version: &Version) -> bool {
        self.range.satisfies(version)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_any() {
            write!(f, "{} (any version)", self.id)
        } else {
            write!(f, "{} (version: {})", self.id, self.range)
        }
    }
}

/// A plugin-provided override for a logically named resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDecl {
    /// Logical path the host asks for, e.g. `data/units/slime.json`.
    pub path: String,
    /// File providing the content, relative to the plugin directory.
    pub file: String,
}

/// The parsed, validated declaration of a plugin.
#[derive(Debug, Clone)]
pub struct PluginManifest {
    /// Globally unique identifier. Non-empty; duplicates across the loaded
    /// set are a hard load error.
    pub id: String,
    /// Human-readable name. Falls back to `id` when not declared.
    pub display_name: String,
    /// Plugin version.
    pub version: Version,
    /// Hard dependencies: must exist and match the range for this plugin to
    /// load at all.
    pub requires: Vec<DependencyRef>,
    /// Soft dependencies: influence ordering when present and compatible,
    /// never block loading.
    pub optional: Vec<DependencyRef>,
    /// Plugins this one must load after, when they are present.
    pub load_after: Vec<String>,
    /// Plugins this one must load before, when they are present.
    pub load_before: Vec<String>,
    /// Tie-break among otherwise-independent plugins; lower loads first.
    pub priority: i32,
    /// Resource overrides provided by this plugin.
    pub assets: Vec<AssetDecl>,
    /// Library file inside the plugin directory holding the entry point.
    /// `None` for plugins registered statically by the host.
    pub entry_point: Option<String>,
    /// Directory the manifest was discovered in.
    pub base_dir: PathBuf,
}

// --- Intermediate structs for deserialization ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawDependencyRef {
    id: String,
    #[serde(default)]
    version_range: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawAssetDecl {
    path: String,
    file: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    version: String,
    #[serde(default)]
    requires: Vec<RawDependencyRef>,
    #[serde(default)]
    optional: Vec<RawDependencyRef>,
    #[serde(default)]
    load_after: Vec<String>,
    #[serde(default)]
    load_before: Vec<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    assets: Vec<RawAssetDecl>,
    #[serde(default)]
    entry_point: Option<String>,
}

// --- End intermediate structs ---

/// True when `value` is a plain relative path that never escapes its root.
fn is_safe_relative(value: &str) -> bool {
    let path = Path::new(value);
    !value.is_empty()
        && !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl PluginManifest {
    /// Parses a manifest from JSON content. Pure: no filesystem access.
    ///
    /// `origin` is the path the content came from, used only for error
    /// reporting; `base_dir` of the result is its parent directory.
    pub fn parse_str(content: &str, origin: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|source| ManifestError::Json {
                path: origin.to_path_buf(),
                source,
            })?;

        if raw.id.trim().is_empty() {
            return Err(ManifestError::EmptyField {
                path: origin.to_path_buf(),
                field: "id",
            });
        }

        let parsed_version =
            Version::parse(&raw.version).map_err(|source| ManifestError::InvalidVersion {
                path: origin.to_path_buf(),
                value: raw.version.clone(),
                source,
            })?;

        let parse_deps = |raw_deps: Vec<RawDependencyRef>| -> Result<Vec<DependencyRef>, ManifestError> {
            raw_deps
                .into_iter()
                .map(|raw_dep| {
                    let range = match raw_dep.version_range {
                        Some(expr) => VersionRange::parse(&expr).map_err(|source| {
                            ManifestError::InvalidRange {
                                path: origin.to_path_buf(),
                                dependency: raw_dep.id.clone(),
                                value: expr,
                                source,
                            }
                        })?,
                        None => VersionRange::any(),
                    };
                    Ok(DependencyRef {
                        id: raw_dep.id,
                        range,
                    })
                })
                .collect()
        };

        if let Some(ref entry) = raw.entry_point {
            if !is_safe_relative(entry) {
                return Err(ManifestError::InvalidEntryPoint {
                    path: origin.to_path_buf(),
                    value: entry.clone(),
                });
            }
        }

        let mut assets = Vec::with_capacity(raw.assets.len());
        for decl in raw.assets {
            if !is_safe_relative(&decl.file) {
                return Err(ManifestError::InvalidAssetPath {
                    path: origin.to_path_buf(),
                    value: decl.file,
                });
            }
            assets.push(AssetDecl {
                path: decl.path,
                file: decl.file,
            });
        }

        Ok(Self {
            display_name: raw.display_name.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            version: parsed_version,
            requires: parse_deps(raw.requires)?,
            optional: parse_deps(raw.optional)?,
            load_after: raw.load_after,
            load_before: raw.load_before,
            priority: raw.priority,
            assets,
            entry_point: raw.entry_point,
            base_dir: origin.parent().unwrap_or_else(|| Path::new("")).to_path_buf(),
        })
    }

    /// Starts a builder, mainly for statically registered plugins and tests.
    pub fn builder(id: &str, version: Version) -> ManifestBuilder {
        ManifestBuilder::new(id, version)
    }
}

/// Builder for creating a plugin manifest in code.
pub struct ManifestBuilder {
    manifest: PluginManifest,
}

impl ManifestBuilder {
    pub fn new(id: &str, version: Version) -> Self {
        Self {
            manifest: PluginManifest {
                id: id.to_string(),
                display_name: id.to_string(),
                version,
                requires: Vec::new(),
                optional: Vec::new(),
                load_after: Vec::new(),
                load_before: Vec::new(),
                priority: 0,
                assets: Vec::new(),
                entry_point: None,
                base_dir: PathBuf::new(),
            },
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.manifest.display_name = name.to_string();
        self
    }

    /// Adds a hard dependency.
    pub fn requires(mut self, dep: DependencyRef) -> Self {
        self.manifest.requires.push(dep);
        self
    }

    /// Adds a soft dependency.
    pub fn optional(mut self, dep: DependencyRef) -> Self {
        self.manifest.optional.push(dep);
        self
    }

    pub fn load_after(mut self, id: &str) -> Self {
        self.manifest.load_after.push(id.to_string());
        self
    }

    pub fn load_before(mut self, id: &str) -> Self {
        self.manifest.load_before.push(id.to_string());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.manifest.priority = priority;
        self
    }

    pub fn asset(mut self, path: &str, file: &str) -> Self {
        self.manifest.assets.push(AssetDecl {
            path: path.to_string(),
            file: file.to_string(),
        });
        self
    }

    pub fn entry_point(mut self, entry_point: &str) -> Self {
        self.manifest.entry_point = Some(entry_point.to_string());
        self
    }

    pub fn base_dir(mut self, dir: &Path) -> Self {
        self.manifest.base_dir = dir.to_path_buf();
        self
    }

    pub fn build(self) -> PluginManifest {
        self.manifest
    }
}
