#![cfg(test)]

use semver::Version;

use crate::manifest::{DependencyRef, PluginManifest, VersionRange};
use crate::resolver::graph::{DependencyGraph, EdgeKind};
use crate::resolver::Diagnostic;

fn plugin(id: &str, version: Version) -> PluginManifest {
    PluginManifest::builder(id, version).build()
}

#[test]
fn test_required_dependency_produces_edge() {
    let manifests = vec![
        plugin("core", Version::new(1, 2, 0)),
        PluginManifest::builder("addon", Version::new(1, 0, 0))
            .requires(DependencyRef::with_range(
                "core",
                VersionRange::parse(">=1.0.0").unwrap(),
            ))
            .build(),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(diagnostics.is_empty());
    assert_eq!(graph.node_count(), 2);
    assert!(graph
        .edges()
        .iter()
        .any(|e| e.from == "addon" && e.to == "core" && e.kind == EdgeKind::Required));
}

#[test]
fn test_missing_required_dependency_excludes_plugin() {
    let manifests = vec![
        plugin("standalone", Version::new(1, 0, 0)),
        PluginManifest::builder("needy", Version::new(1, 0, 0))
            .requires(DependencyRef::any("ghost"))
            .build(),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(graph.contains("standalone"));
    assert!(!graph.contains("needy"));
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::MissingOrIncompatibleDependency { dependent, required, found: None, .. }
            if dependent == "needy" && required == "ghost"
    ));
}

#[test]
fn test_incompatible_version_reports_found_version() {
    let manifests = vec![
        plugin("core", Version::new(1, 0, 0)),
        PluginManifest::builder("addon", Version::new(1, 0, 0))
            .requires(DependencyRef::with_range(
                "core",
                VersionRange::parse(">=2.0.0").unwrap(),
            ))
            .build(),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(!graph.contains("addon"));
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::MissingOrIncompatibleDependency { found: Some(v), .. }
            if *v == Version::new(1, 0, 0)
    ));
}

#[test]
fn test_exclusion_cascades_through_required_edges() {
    // a requires ghost (missing), b requires a, c requires b, d independent.
    let manifests = vec![
        PluginManifest::builder("a", Version::new(1, 0, 0))
            .requires(DependencyRef::any("ghost"))
            .build(),
        PluginManifest::builder("b", Version::new(1, 0, 0))
            .requires(DependencyRef::any("a"))
            .build(),
        PluginManifest::builder("c", Version::new(1, 0, 0))
            .requires(DependencyRef::any("b"))
            .build(),
        plugin("d", Version::new(1, 0, 0)),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(!graph.contains("a"));
    assert!(!graph.contains("b"));
    assert!(!graph.contains("c"));
    assert!(graph.contains("d"));

    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::TransitiveDependencyFailure { dependent, via } if dependent == "b" && via == "a"
    )));
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::TransitiveDependencyFailure { dependent, via } if dependent == "c" && via == "b"
    )));
}

#[test]
fn test_optional_dependency_missing_is_warning_only() {
    let manifests = vec![PluginManifest::builder("flexible", Version::new(1, 0, 0))
        .optional(DependencyRef::any("extra"))
        .build()];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(graph.contains("flexible"));
    assert!(graph.edges().is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].severity(),
        crate::resolver::Severity::Warning
    );
}

#[test]
fn test_optional_dependency_present_adds_edge() {
    let manifests = vec![
        plugin("extra", Version::new(1, 0, 0)),
        PluginManifest::builder("flexible", Version::new(1, 0, 0))
            .optional(DependencyRef::with_range(
                "extra",
                VersionRange::parse(">=1.0.0").unwrap(),
            ))
            .build(),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(diagnostics.is_empty());
    assert!(graph
        .edges()
        .iter()
        .any(|e| e.from == "flexible" && e.to == "extra" && e.kind == EdgeKind::Optional));
}

#[test]
fn test_optional_dependency_incompatible_version_adds_no_edge() {
    let manifests = vec![
        plugin("extra", Version::new(1, 0, 0)),
        PluginManifest::builder("flexible", Version::new(1, 0, 0))
            .optional(DependencyRef::with_range(
                "extra",
                VersionRange::parse(">=2.0.0").unwrap(),
            ))
            .build(),
    ];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(graph.contains("flexible"));
    assert!(graph.contains("extra"));
    assert!(graph.edges().is_empty());
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::OptionalDependencyMissing { found: Some(_), .. }
    ));
}

#[test]
fn test_order_hints_for_absent_plugins_are_silently_ignored() {
    let manifests = vec![PluginManifest::builder("solo", Version::new(1, 0, 0))
        .load_after("nobody")
        .load_before("nobody-else")
        .build()];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(diagnostics.is_empty());
    assert!(graph.edges().is_empty());
    assert!(graph.contains("solo"));
}

#[test]
fn test_load_before_reverses_edge_direction() {
    let manifests = vec![
        plugin("late", Version::new(1, 0, 0)),
        PluginManifest::builder("early", Version::new(1, 0, 0))
            .load_before("late")
            .build(),
    ];

    let (graph, _) = DependencyGraph::build(&manifests);

    // "early loadBefore late" means late depends on early.
    assert!(graph
        .edges()
        .iter()
        .any(|e| e.from == "late" && e.to == "early" && e.kind == EdgeKind::OrderOnly));
}

#[test]
fn test_self_dependency_is_fatal() {
    let manifests = vec![PluginManifest::builder("narcissus", Version::new(1, 0, 0))
        .requires(DependencyRef::any("narcissus"))
        .build()];

    let (graph, diagnostics) = DependencyGraph::build(&manifests);

    assert!(!graph.contains("narcissus"));
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::SelfDependency { id } if id == "narcissus"
    ));
}

#[test]
fn test_duplicate_ids_are_reported_as_global_fatal() {
    let manifests = vec![
        plugin("twin", Version::new(1, 0, 0)),
        plugin("twin", Version::new(2, 0, 0)),
    ];

    let (_, diagnostics) = DependencyGraph::build(&manifests);

    assert!(diagnostics.iter().any(|d| d.is_global_fatal()));
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::DuplicateId { id, .. } if id == "twin"
    ));
}
