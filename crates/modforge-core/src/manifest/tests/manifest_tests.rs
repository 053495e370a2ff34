#![cfg(test)]

use std::path::Path;

use semver::Version;

use crate::manifest::error::ManifestError;
use crate::manifest::{DependencyRef, PluginManifest, VersionRange};

const ORIGIN: &str = "/plugins/rebalance/manifest.json";

#[test]
fn test_parse_full_manifest() {
    let content = r#"{
        "id": "rebalance",
        "displayName": "Battle Rebalance",
        "version": "1.4.0",
        "requires": [
            { "id": "core-battle", "versionRange": ">=2.0.0 <3.0.0" }
        ],
        "optional": [
            { "id": "hardcore-mode" }
        ],
        "loadAfter": ["base-tweaks"],
        "loadBefore": ["late-cosmetics"],
        "priority": -5,
        "assets": [
            { "path": "data/units/slime.json", "file": "assets/slime.json" }
        ],
        "entryPoint": "librebalance.so"
    }"#;

    let manifest = PluginManifest::parse_str(content, Path::new(ORIGIN)).unwrap();

    assert_eq!(manifest.id, "rebalance");
    assert_eq!(manifest.display_name, "Battle Rebalance");
    assert_eq!(manifest.version, Version::new(1, 4, 0));
    assert_eq!(
        manifest.requires,
        vec![DependencyRef::with_range(
            "core-battle",
            VersionRange::parse(">=2.0.0 <3.0.0").unwrap()
        )]
    );
    assert_eq!(manifest.optional, vec![DependencyRef::any("hardcore-mode")]);
    assert_eq!(manifest.load_after, vec!["base-tweaks"]);
    assert_eq!(manifest.load_before, vec!["late-cosmetics"]);
    assert_eq!(manifest.priority, -5);
    assert_eq!(manifest.assets.len(), 1);
    assert_eq!(manifest.entry_point.as_deref(), Some("librebalance.so"));
    assert_eq!(manifest.base_dir, Path::new("/plugins/rebalance"));
}

#[test]
fn test_parse_minimal_manifest_defaults() {
    let content = r#"{ "id": "tiny", "version": "0.1.0" }"#;
    let manifest = PluginManifest::parse_str(content, Path::new(ORIGIN)).unwrap();

    assert_eq!(manifest.display_name, "tiny");
    assert!(manifest.requires.is_empty());
    assert!(manifest.optional.is_empty());
    assert!(manifest.load_after.is_empty());
    assert!(manifest.load_before.is_empty());
    assert_eq!(manifest.priority, 0);
    assert!(manifest.assets.is_empty());
    assert!(manifest.entry_point.is_none());
}

#[test]
fn test_missing_required_fields_fail() {
    let no_id = r#"{ "version": "1.0.0" }"#;
    assert!(matches!(
        PluginManifest::parse_str(no_id, Path::new(ORIGIN)),
        Err(ManifestError::Json { .. })
    ));

    let no_version = r#"{ "id": "x" }"#;
    assert!(matches!(
        PluginManifest::parse_str(no_version, Path::new(ORIGIN)),
        Err(ManifestError::Json { .. })
    ));

    let empty_id = r#"{ "id": "  ", "version": "1.0.0" }"#;
    assert!(matches!(
        PluginManifest::parse_str(empty_id, Path::new(ORIGIN)),
        Err(ManifestError::EmptyField { field: "id", .. })
    ));
}

#[test]
fn test_malformed_version_and_range_fail() {
    let bad_version = r#"{ "id": "x", "version": "one" }"#;
    assert!(matches!(
        PluginManifest::parse_str(bad_version, Path::new(ORIGIN)),
        Err(ManifestError::InvalidVersion { .. })
    ));

    let bad_range = r#"{
        "id": "x",
        "version": "1.0.0",
        "requires": [{ "id": "y", "versionRange": "^oops" }]
    }"#;
    match PluginManifest::parse_str(bad_range, Path::new(ORIGIN)) {
        Err(ManifestError::InvalidRange { dependency, .. }) => assert_eq!(dependency, "y"),
        other => panic!("expected InvalidRange, got {:?}", other),
    }
}

#[test]
fn test_entry_point_must_stay_inside_plugin_dir() {
    let traversal = r#"{ "id": "x", "version": "1.0.0", "entryPoint": "../../evil.so" }"#;
    assert!(matches!(
        PluginManifest::parse_str(traversal, Path::new(ORIGIN)),
        Err(ManifestError::InvalidEntryPoint { .. })
    ));

    let absolute = r#"{ "id": "x", "version": "1.0.0", "entryPoint": "/lib/evil.so" }"#;
    assert!(matches!(
        PluginManifest::parse_str(absolute, Path::new(ORIGIN)),
        Err(ManifestError::InvalidEntryPoint { .. })
    ));
}

#[test]
fn test_asset_files_must_stay_inside_plugin_dir() {
    let content = r#"{
        "id": "x",
        "version": "1.0.0",
        "assets": [{ "path": "data/a.json", "file": "../outside.json" }]
    }"#;
    assert!(matches!(
        PluginManifest::parse_str(content, Path::new(ORIGIN)),
        Err(ManifestError::InvalidAssetPath { .. })
    ));
}

#[test]
fn test_builder_produces_equivalent_manifest() {
    let manifest = PluginManifest::builder("combat-plus", Version::new(2, 1, 0))
        .display_name("Combat Plus")
        .requires(DependencyRef::with_range(
            "core-battle",
            VersionRange::parse(">=2.0.0").unwrap(),
        ))
        .load_after("base-tweaks")
        .priority(10)
        .asset("data/skills.json", "assets/skills.json")
        .build();

    assert_eq!(manifest.id, "combat-plus");
    assert_eq!(manifest.display_name, "Combat Plus");
    assert_eq!(manifest.requires.len(), 1);
    assert_eq!(manifest.load_after, vec!["base-tweaks"]);
    assert_eq!(manifest.priority, 10);
    assert_eq!(manifest.assets[0].path, "data/skills.json");
}
