#![cfg(test)]

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::config::{ConfigError, EngineConfig};

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.plugin_dirs, vec![PathBuf::from("mods")]);
    assert!(config.base_asset_dir.is_none());
    assert_eq!(config.init_budget(), Duration::from_millis(5_000));
    assert!(config.allow_dylibs);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_load_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modforge.toml");
    std::fs::write(
        &path,
        r#"
plugin-dirs = ["mods", "extra-mods"]
base-asset-dir = "content"
init-timeout-ms = 250
allow-dylibs = false
"#,
    )
    .unwrap();

    let config = EngineConfig::load_from_file(&path).unwrap();
    assert_eq!(
        config.plugin_dirs,
        vec![PathBuf::from("mods"), PathBuf::from("extra-mods")]
    );
    assert_eq!(config.base_asset_dir, Some(PathBuf::from("content")));
    assert_eq!(config.init_budget(), Duration::from_millis(250));
    assert!(!config.allow_dylibs);
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_load_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modforge.yaml");
    std::fs::write(&path, "plugin-dirs:\n  - packs\ninit-timeout-ms: 100\n").unwrap();

    let config = EngineConfig::load_from_file(&path).unwrap();
    assert_eq!(config.plugin_dirs, vec![PathBuf::from("packs")]);
    assert_eq!(config.init_budget(), Duration::from_millis(100));
    // Unspecified fields keep their defaults.
    assert!(config.allow_dylibs);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modforge.ini");
    std::fs::write(&path, "x=1").unwrap();

    assert!(matches!(
        EngineConfig::load_from_file(&path),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        EngineConfig::load_from_file(std::path::Path::new("/no/such/modforge.toml")),
        Err(ConfigError::Io { .. })
    ));
}
