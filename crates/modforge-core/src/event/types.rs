use std::any::Any;

use crate::event::{Event, EventPriority};

/// Lifecycle events the engine emits to the host.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A plugin finished initializing.
    PluginLoaded { id: String },
    /// A plugin failed to initialize (or was skipped by cascade).
    PluginLoadFailed { id: String, reason: String },
    /// A plugin was unloaded and its modifications revoked.
    PluginUnloaded { id: String },
    /// A dependency cycle was found during resolution.
    CycleDetected { path: Vec<String> },
    /// A new immutable snapshot generation was published.
    GenerationSwapped { generation: u64 },
}

impl Event for EngineEvent {
    fn name(&self) -> &'static str {
        match self {
            EngineEvent::PluginLoaded { .. } => "plugin.loaded",
            EngineEvent::PluginLoadFailed { .. } => "plugin.load_failed",
            EngineEvent::PluginUnloaded { .. } => "plugin.unloaded",
            EngineEvent::CycleDetected { .. } => "resolver.cycle",
            EngineEvent::GenerationSwapped { .. } => "engine.generation",
        }
    }

    fn priority(&self) -> EventPriority {
        match self {
            EngineEvent::CycleDetected { .. } | EngineEvent::PluginLoadFailed { .. } => {
                EventPriority::High
            }
            _ => EventPriority::Normal,
        }
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
