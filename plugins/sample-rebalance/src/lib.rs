//! Sample ModForge plugin.
//!
//! Applies a single patch to the host's turn-order computation. Linked
//! statically into the `modforge` binary and also buildable as a cdylib
//! loadable through a manifest `entryPoint`.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use semver::Version;

use modforge_core::loader::{Plugin, PluginContext, PluginError};
use modforge_core::manifest::PluginManifest;
use modforge_core::patch::{HookTransform, PatchKind, PatchOrdering};

pub const PLUGIN_ID: &str = "sample-rebalance";

/// Target signature this plugin modifies.
const TURN_ORDER_TARGET: &str = "battle.turn_order";

#[derive(Default)]
pub struct RebalancePlugin;

struct TurnOrderWeighting;

impl HookTransform for TurnOrderWeighting {
    fn describe(&self) -> &str {
        "smooth turn-order speed weighting"
    }
}

#[async_trait]
impl Plugin for RebalancePlugin {
    fn id(&self) -> &str {
        PLUGIN_ID
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn init(&self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        info!(
            "{} initializing ({} plugin(s) loaded before it)",
            PLUGIN_ID,
            ctx.loaded_before().len()
        );
        ctx.patches()
            .apply(
                TURN_ORDER_TARGET,
                PatchKind::After,
                PatchOrdering::LoadOrder,
                Arc::new(TurnOrderWeighting),
            )
            .await
            .map_err(|e| PluginError::Init(e.to_string()))?;
        Ok(())
    }

    fn shutdown(&self) -> Result<(), PluginError> {
        info!("{} shut down", PLUGIN_ID);
        Ok(())
    }
}

/// Manifest for static registration by the host.
pub fn manifest() -> PluginManifest {
    PluginManifest::builder(PLUGIN_ID, Version::new(0, 1, 0))
        .display_name("Sample Rebalance")
        .build()
}

/// Entry point for dynamic loading of the cdylib build.
#[no_mangle]
pub fn modforge_plugin_entry() -> Box<dyn Plugin> {
    Box::new(RebalancePlugin)
}
