//! Dependency graph construction over discovered manifests.
//!
//! The graph is an arena keyed by plugin id, not a pointer graph, so cycle
//! paths can be extracted without aliasing concerns. Edges are directed
//! dependent -> dependency: `to` must load before `from`.

use std::collections::{BTreeMap, HashSet};

use log::warn;

use crate::manifest::PluginManifest;
use crate::resolver::diagnostic::Diagnostic;

/// What kind of constraint an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A hard dependency: target must exist and match the version range.
    Required,
    /// A soft dependency that happened to be present and compatible.
    Optional,
    /// A `loadAfter`/`loadBefore` hint with no compatibility requirement.
    OrderOnly,
}

/// A directed ordering constraint: `to` must load before `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// The loadable set of plugins plus the ordering constraints among them.
///
/// Plugins with unsatisfiable hard requirements never become nodes; they are
/// reported through the diagnostics returned by [`DependencyGraph::build`].
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Loadable plugin ids mapped to their tie-break priority.
    nodes: BTreeMap<String, i32>,
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Builds the graph for a set of manifests, collecting diagnostics for
    /// everything that cannot participate.
    ///
    /// Hard-dependency failures cascade: if A requires B and B is excluded,
    /// A is excluded too, transitively.
    pub fn build(manifests: &[PluginManifest]) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();

        // Duplicate ids make identity ambiguous; report every duplicate and
        // let the caller abort the load. The graph keeps first occurrences
        // so diagnostics further down still make sense.
        let mut by_id: BTreeMap<&str, &PluginManifest> = BTreeMap::new();
        for manifest in manifests {
            if let Some(first) = by_id.get(manifest.id.as_str()) {
                diagnostics.push(Diagnostic::DuplicateId {
                    id: manifest.id.clone(),
                    first: first.base_dir.clone(),
                    second: manifest.base_dir.clone(),
                });
            } else {
                by_id.insert(manifest.id.as_str(), manifest);
            }
        }

        let mut excluded: HashSet<String> = HashSet::new();

        // Direct failures: self-dependency and unmet hard requirements.
        for (id, manifest) in &by_id {
            if references_self(manifest) {
                diagnostics.push(Diagnostic::SelfDependency { id: id.to_string() });
                excluded.insert(id.to_string());
                continue;
            }

            for dep in &manifest.requires {
                match by_id.get(dep.id.as_str()) {
                    Some(target) if dep.compatible_with(&target.version) => {}
                    Some(target) => {
                        diagnostics.push(Diagnostic::MissingOrIncompatibleDependency {
                            dependent: id.to_string(),
                            required: dep.id.clone(),
                            range: dep.range.clone(),
                            found: Some(target.version.clone()),
                        });
                        excluded.insert(id.to_string());
                    }
                    None => {
                        diagnostics.push(Diagnostic::MissingOrIncompatibleDependency {
                            dependent: id.to_string(),
                            required: dep.id.clone(),
                            range: dep.range.clone(),
                            found: None,
                        });
                        excluded.insert(id.to_string());
                    }
                }
            }
        }

        // Cascade exclusions forward through required edges until stable.
        let mut changed = true;
        while changed {
            changed = false;
            for (id, manifest) in &by_id {
                if excluded.contains(*id) {
                    continue;
                }
                if let Some(dep) = manifest
                    .requires
                    .iter()
                    .find(|dep| excluded.contains(dep.id.as_str()))
                {
                    diagnostics.push(Diagnostic::TransitiveDependencyFailure {
                        dependent: id.to_string(),
                        via: dep.id.clone(),
                    });
                    excluded.insert(id.to_string());
                    changed = true;
                }
            }
        }

        // Assemble nodes and edges over the surviving set.
        let mut graph = DependencyGraph::default();
        for (id, manifest) in &by_id {
            if !excluded.contains(*id) {
                graph.nodes.insert(id.to_string(), manifest.priority);
            }
        }

        for (id, manifest) in &by_id {
            if excluded.contains(*id) {
                continue;
            }

            for dep in &manifest.requires {
                // Presence and compatibility were checked above.
                graph.push_edge(id, &dep.id, EdgeKind::Required);
            }

            for dep in &manifest.optional {
                match by_id.get(dep.id.as_str()) {
                    Some(target)
                        if !excluded.contains(dep.id.as_str())
                            && dep.compatible_with(&target.version) =>
                    {
                        graph.push_edge(id, &dep.id, EdgeKind::Optional);
                    }
                    Some(target) if dep.compatible_with(&target.version) => {
                        // Present and compatible on paper, but the target
                        // itself cannot load; treat as absent.
                        diagnostics.push(Diagnostic::OptionalDependencyMissing {
                            dependent: id.to_string(),
                            optional: dep.id.clone(),
                            found: None,
                        });
                    }
                    Some(target) => {
                        diagnostics.push(Diagnostic::OptionalDependencyMissing {
                            dependent: id.to_string(),
                            optional: dep.id.clone(),
                            found: Some(target.version.clone()),
                        });
                    }
                    None => {
                        diagnostics.push(Diagnostic::OptionalDependencyMissing {
                            dependent: id.to_string(),
                            optional: dep.id.clone(),
                            found: None,
                        });
                    }
                }
            }

            // Order hints are silently ignored when the named plugin is not
            // in the loadable set.
            for after in &manifest.load_after {
                if graph.nodes.contains_key(after) {
                    graph.push_edge(id, after, EdgeKind::OrderOnly);
                }
            }
            for before in &manifest.load_before {
                if graph.nodes.contains_key(before) {
                    graph.push_edge(before, id, EdgeKind::OrderOnly);
                }
            }
        }

        if !excluded.is_empty() {
            warn!(
                "{} plugin(s) excluded before ordering: {:?}",
                excluded.len(),
                {
                    let mut ids: Vec<&String> = excluded.iter().collect();
                    ids.sort();
                    ids
                }
            );
        }

        (graph, diagnostics)
    }

    fn push_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        self.edges.push(DependencyEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Tie-break priority of a node; nodes default to 0.
    pub fn priority(&self, id: &str) -> i32 {
        self.nodes.get(id).copied().unwrap_or(0)
    }

    /// Loadable plugin ids in lexicographic order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn references_self(manifest: &PluginManifest) -> bool {
    let id = &manifest.id;
    manifest.requires.iter().any(|d| &d.id == id)
        || manifest.optional.iter().any(|d| &d.id == id)
        || manifest.load_after.contains(id)
        || manifest.load_before.contains(id)
}
