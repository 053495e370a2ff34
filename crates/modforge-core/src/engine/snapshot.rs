//! Generation-tagged immutable snapshots.
//!
//! Every (re)load produces an entirely new snapshot; readers hold an `Arc`
//! and either see the old generation completely or the new one completely.
//! Nothing mutates a snapshot after publication.

use crate::assets::AssetIndex;
use crate::resolver::Diagnostic;

/// The published, read-only view of one load generation.
#[derive(Debug)]
pub struct Snapshot {
    /// Monotonically increasing generation counter; 0 is the empty
    /// pre-load generation.
    pub generation: u64,
    /// Successfully loaded plugins, in load order.
    pub load_order: Vec<String>,
    /// Everything reported while producing this generation.
    pub diagnostics: Vec<Diagnostic>,
    /// Asset override index for this generation.
    pub assets: AssetIndex,
}

impl Snapshot {
    /// The generation that exists before anything has been loaded.
    pub(crate) fn empty() -> Self {
        Self {
            generation: 0,
            load_order: Vec::new(),
            diagnostics: Vec::new(),
            assets: AssetIndex::default(),
        }
    }
}
