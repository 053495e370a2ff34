//! # Patch Isolation
//!
//! Bookkeeping for runtime behavior modifications ("patches") plugins apply
//! to shared host code. The mechanism that actually intercepts or rewrites
//! behavior belongs to the host; this module owns the part that must never
//! be wrong: which plugin is responsible for which modification, in what
//! order modifications of the same target stack, and how to revoke exactly
//! one plugin's contributions without disturbing the rest.
//!
//! Every modification is applied through a per-plugin [`PatchSession`], so
//! records are individually attributable and a plugin's records can be
//! destroyed atomically when it unloads.

pub mod error;

pub use error::PatchError;

#[cfg(test)]
mod tests;

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::Mutex;

use crate::resolver::diagnostic::Diagnostic;

/// How a transform composes with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Runs before the original behavior.
    Before,
    /// Runs after the original behavior.
    After,
    /// Replaces the original behavior outright.
    Replace,
}

/// Placement of one modification relative to another plugin's modification
/// of the same target. `LoadOrder` is the fallback for everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PatchOrdering {
    #[default]
    LoadOrder,
    /// Run before the named plugin's modifications of this target.
    Before(String),
    /// Run after the named plugin's modifications of this target.
    After(String),
}

/// The opaque code-transformation provider a plugin hands over. The manager
/// stores it and returns it in chain order; it never looks inside.
pub trait HookTransform: Send + Sync {
    /// Short human-readable description for diagnostics.
    fn describe(&self) -> &str;
}

/// Unique handle for one applied modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchRecordId(u64);

/// One code modification, owned exclusively by the manager.
#[derive(Clone)]
pub struct PatchRecord {
    pub id: PatchRecordId,
    pub plugin_id: String,
    pub target: String,
    pub kind: PatchKind,
    pub ordering: PatchOrdering,
    /// Monotonic application sequence number, not wall-clock time, so
    /// replays and tests are deterministic.
    pub applied_at: u64,
    /// Position of the owning plugin in the load order, the ordering
    /// fallback when no explicit hints apply.
    load_index: usize,
    pub transform: Arc<dyn HookTransform>,
}

impl fmt::Debug for PatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRecord")
            .field("id", &self.id)
            .field("plugin_id", &self.plugin_id)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("ordering", &self.ordering)
            .field("applied_at", &self.applied_at)
            .field("transform", &self.transform.describe())
            .finish()
    }
}

#[derive(Default)]
struct ChainState {
    /// Target signature -> records in final (applied) order.
    chains: BTreeMap<String, Vec<PatchRecord>>,
    /// Active sessions: plugin id -> load index.
    sessions: HashMap<String, usize>,
    /// Rejected placement hints, kept for the load report.
    conflicts: Vec<Diagnostic>,
    next_seq: u64,
    next_record_id: u64,
}

/// Tracks every plugin's modifications and their per-target chains.
///
/// Cloning is cheap and shares state; sessions hold the same shared state so
/// a session handle stays valid across task boundaries.
#[derive(Clone, Default)]
pub struct PatchManager {
    state: Arc<Mutex<ChainState>>,
}

impl PatchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the modification session for `plugin_id`. `load_index` is the
    /// plugin's position in the resolved load order.
    pub async fn begin_session(
        &self,
        plugin_id: &str,
        load_index: usize,
    ) -> Result<PatchSession, PatchError> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(plugin_id) {
            return Err(PatchError::SessionAlreadyActive(plugin_id.to_string()));
        }
        state.sessions.insert(plugin_id.to_string(), load_index);
        debug!("patch session opened for '{}'", plugin_id);
        Ok(PatchSession {
            plugin_id: plugin_id.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    /// Revokes all of the plugin's modifications and closes its session.
    ///
    /// Exactly this plugin's records are removed from every chain it
    /// participated in; other plugins' records keep their relative order,
    /// which remains valid because removing a record can only drop
    /// constraints, never add them. Returns the number of revoked records.
    pub async fn end_session(&self, plugin_id: &str) -> usize {
        let mut state = self.state.lock().await;
        state.sessions.remove(plugin_id);

        let mut revoked = 0;
        state.chains.retain(|target, records| {
            let before = records.len();
            records.retain(|r| r.plugin_id != plugin_id);
            let removed = before - records.len();
            if removed > 0 {
                revoked += removed;
                debug!(
                    "revoked {} record(s) of '{}' from target '{}'",
                    removed, plugin_id, target
                );
            }
            !records.is_empty()
        });

        if revoked > 0 {
            debug!("patch session closed for '{}', {} record(s) revoked", plugin_id, revoked);
        }
        revoked
    }

    /// Closes every active session and drops all records.
    pub async fn end_all_sessions(&self) {
        let plugins: Vec<String> = {
            let state = self.state.lock().await;
            state.sessions.keys().cloned().collect()
        };
        for plugin in plugins {
            self.end_session(&plugin).await;
        }
    }

    /// Plugins currently holding an open session, sorted.
    pub async fn active_sessions(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The plugins modifying `target`, in chain order. Empty when nothing
    /// modifies the target.
    pub async fn modification_chain(&self, target: &str) -> Vec<String> {
        let state = self.state.lock().await;
        let mut chain: Vec<String> = state
            .chains
            .get(target)
            .map(|records| records.iter().map(|r| r.plugin_id.clone()).collect())
            .unwrap_or_default();
        // Records of one plugin are contiguous in a chain.
        chain.dedup();
        chain
    }

    /// The transforms for `target` in final order, attributed to their
    /// owning plugin, for the host to install.
    pub async fn chain_transforms(&self, target: &str) -> Vec<(String, Arc<dyn HookTransform>)> {
        let state = self.state.lock().await;
        state
            .chains
            .get(target)
            .map(|records| {
                records
                    .iter()
                    .map(|r| (r.plugin_id.clone(), Arc::clone(&r.transform)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every target signature currently modified, sorted.
    pub async fn targets(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.chains.keys().cloned().collect()
    }

    /// Drains the ordering-conflict diagnostics accumulated since the last
    /// call, for inclusion in the load report.
    pub async fn take_conflicts(&self) -> Vec<Diagnostic> {
        let mut state = self.state.lock().await;
        std::mem::take(&mut state.conflicts)
    }

    /// Number of records currently held for `plugin_id`.
    pub async fn record_count(&self, plugin_id: &str) -> usize {
        let state = self.state.lock().await;
        state
            .chains
            .values()
            .flat_map(|records| records.iter())
            .filter(|r| r.plugin_id == plugin_id)
            .count()
    }
}

/// A plugin's handle for applying modifications. Obtained from
/// [`PatchManager::begin_session`]; becomes inert once the session ends.
pub struct PatchSession {
    plugin_id: String,
    state: Arc<Mutex<ChainState>>,
}

impl PatchSession {
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Applies a modification to `target`.
    ///
    /// Another plugin already modifying the same target is not an error —
    /// stacking is the point of a mod system — but the result is an explicit
    /// ordered chain, never a silent overwrite. A placement hint that
    /// contradicts the existing chain rejects only the incoming record and
    /// leaves the chain untouched.
    pub async fn apply(
        &mut self,
        target: &str,
        kind: PatchKind,
        ordering: PatchOrdering,
        transform: Arc<dyn HookTransform>,
    ) -> Result<PatchRecordId, PatchError> {
        let mut state = self.state.lock().await;

        let load_index = match state.sessions.get(&self.plugin_id) {
            Some(index) => *index,
            None => return Err(PatchError::NoActiveSession(self.plugin_id.clone())),
        };

        match &ordering {
            PatchOrdering::Before(other) | PatchOrdering::After(other)
                if other == &self.plugin_id =>
            {
                return Err(reject(
                    &mut state,
                    &self.plugin_id,
                    target,
                    "placement hint references the plugin itself".to_string(),
                ));
            }
            _ => {}
        }

        let record = PatchRecord {
            id: PatchRecordId(state.next_record_id),
            plugin_id: self.plugin_id.clone(),
            target: target.to_string(),
            kind,
            ordering,
            applied_at: state.next_seq,
            load_index,
            transform,
        };

        let existing = state.chains.get(target).cloned().unwrap_or_default();
        if let Some(other) = existing
            .iter()
            .find(|r| r.plugin_id != self.plugin_id)
        {
            // Non-fatal by design: both modifications are retained in an
            // explicit order and the chain stays queryable.
            warn!(
                "target '{}' already modified by '{}'; stacking modification from '{}'",
                target, other.plugin_id, self.plugin_id
            );
        }

        let mut candidate = existing;
        candidate.push(record.clone());

        let reordered = match order_chain(&candidate) {
            Ok(reordered) => reordered,
            Err(detail) => return Err(reject(&mut state, &self.plugin_id, target, detail)),
        };

        state.next_record_id += 1;
        state.next_seq += 1;
        state.chains.insert(target.to_string(), reordered);
        debug!(
            "plugin '{}' applied {:?} patch to '{}'",
            self.plugin_id, kind, target
        );
        Ok(record.id)
    }
}

/// Records a rejected placement hint and builds the matching error.
fn reject(state: &mut ChainState, plugin: &str, target: &str, detail: String) -> PatchError {
    warn!(
        "rejected patch from '{}' on '{}': {}",
        plugin, target, detail
    );
    state.conflicts.push(Diagnostic::PatchOrderingConflict {
        plugin: plugin.to_string(),
        target: target.to_string(),
        detail: detail.clone(),
    });
    PatchError::OrderingConflict {
        plugin: plugin.to_string(),
        target: target.to_string(),
        detail,
    }
}

/// Computes the final order of a chain, or a conflict description when the
/// placement hints cannot all hold.
///
/// A plugin's records stay contiguous and in application order; plugins are
/// ordered by their hints, falling back to load order.
fn order_chain(records: &[PatchRecord]) -> Result<Vec<PatchRecord>, String> {
    // Group records per plugin; the group inherits the plugin's load index.
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        groups.insert(record.plugin_id.as_str(), record.load_index);
    }

    // Hint edges among groups present in this chain. Hints naming plugins
    // that never modified the target stay dormant.
    let mut constraints: BTreeSet<(&str, &str)> = BTreeSet::new();
    for record in records {
        let this = record.plugin_id.as_str();
        match &record.ordering {
            PatchOrdering::Before(other) if groups.contains_key(other.as_str()) => {
                constraints.insert((this, other.as_str()));
            }
            PatchOrdering::After(other) if groups.contains_key(other.as_str()) => {
                constraints.insert((other.as_str(), this));
            }
            _ => {}
        }
    }

    // Kahn over the plugin groups, smallest (load_index, plugin) first.
    let mut in_degree: BTreeMap<&str, usize> = groups.keys().map(|&p| (p, 0)).collect();
    for (_, to) in &constraints {
        if let Some(degree) = in_degree.get_mut(to) {
            *degree += 1;
        }
    }

    let mut candidates: BinaryHeap<Reverse<(usize, &str)>> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&p, _)| Reverse((groups[p], p)))
        .collect();

    let mut plugin_order: Vec<&str> = Vec::with_capacity(groups.len());
    while let Some(Reverse((_, plugin))) = candidates.pop() {
        plugin_order.push(plugin);
        for &(from, to) in &constraints {
            if from == plugin {
                if let Some(degree) = in_degree.get_mut(to) {
                    *degree -= 1;
                    if *degree == 0 {
                        candidates.push(Reverse((groups[to], to)));
                    }
                }
            }
        }
    }

    if plugin_order.len() != groups.len() {
        let mut stuck: Vec<&str> = groups
            .keys()
            .copied()
            .filter(|p| !plugin_order.contains(p))
            .collect();
        stuck.sort_unstable();
        return Err(format!(
            "placement hints form a cycle among plugins: {}",
            stuck.join(", ")
        ));
    }

    let mut ordered = Vec::with_capacity(records.len());
    for plugin in plugin_order {
        let mut group: Vec<PatchRecord> = records
            .iter()
            .filter(|r| r.plugin_id == plugin)
            .cloned()
            .collect();
        group.sort_by_key(|r| r.applied_at);
        ordered.extend(group);
    }
    Ok(ordered)
}
