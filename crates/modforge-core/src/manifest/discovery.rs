//! Asynchronous discovery of plugin manifests on disk.
//!
//! Each plugin lives in its own directory containing a
//! [`MANIFEST_FILE_NAME`](super::MANIFEST_FILE_NAME) file plus arbitrary
//! plugin-owned content; the directory name does not need to match the
//! plugin id. A malformed manifest yields a diagnostic and skips only that
//! directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use log::{debug, warn};
use tokio::fs;

use crate::manifest::{PluginManifest, ManifestError, MANIFEST_FILE_NAME};
use crate::resolver::diagnostic::Diagnostic;

/// Result of scanning a set of plugin roots.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Manifests that parsed successfully, in scan order.
    pub manifests: Vec<PluginManifest>,
    /// One diagnostic per manifest that failed to parse.
    pub diagnostics: Vec<Diagnostic>,
}

/// Scans every root directory for plugin manifests.
///
/// Missing or unreadable roots are logged and skipped; they are a
/// deployment concern, not a plugin author error.
pub async fn discover(roots: &[PathBuf]) -> Discovered {
    let mut found = Discovered::default();

    for root in roots {
        let exists = match fs::try_exists(root).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("could not check plugin root '{}': {}", root.display(), e);
                false
            }
        };
        if !exists {
            debug!("plugin root '{}' does not exist, skipping", root.display());
            continue;
        }

        let metadata = match fs::metadata(root).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("could not stat plugin root '{}': {}", root.display(), e);
                continue;
            }
        };
        if !metadata.is_dir() {
            continue;
        }

        if let Err(e) = scan_directory(root.clone(), &mut found).await {
            warn!("error scanning plugin root '{}': {}", root.display(), e);
        }
    }

    found
}

/// Boxed wrapper so the recursive async scan has a nameable future type.
fn scan_directory(
    dir: PathBuf,
    found: &mut Discovered,
) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>> {
    Box::pin(scan_directory_inner(dir, found))
}

async fn scan_directory_inner(dir: PathBuf, found: &mut Discovered) -> std::io::Result<()> {
    let mut entries = fs::read_dir(&dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();

        let metadata = match fs::metadata(&entry_path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("could not stat '{}': {}", entry_path.display(), e);
                continue;
            }
        };
        if !metadata.is_dir() {
            continue;
        }

        let manifest_path = entry_path.join(MANIFEST_FILE_NAME);
        match fs::try_exists(&manifest_path).await {
            Ok(true) => match load_manifest(&manifest_path).await {
                Ok(manifest) => {
                    debug!(
                        "discovered plugin '{}' at '{}'",
                        manifest.id,
                        entry_path.display()
                    );
                    found.manifests.push(manifest);
                }
                Err(e) => {
                    warn!("skipping '{}': {}", manifest_path.display(), e);
                    found.diagnostics.push(Diagnostic::ParseFailure {
                        path: manifest_path.clone(),
                        message: e.to_string(),
                    });
                }
            },
            Ok(false) => {}
            Err(e) => {
                warn!("could not check '{}': {}", manifest_path.display(), e);
            }
        }

        // Plugin directories may be grouped into collections; keep scanning
        // below this entry either way.
        if let Err(e) = scan_directory(entry_path.clone(), found).await {
            warn!("error scanning '{}': {}", entry_path.display(), e);
        }
    }

    Ok(())
}

/// Reads and parses a single manifest file.
pub async fn load_manifest(path: &Path) -> Result<PluginManifest, ManifestError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    PluginManifest::parse_str(&content, path)
}
