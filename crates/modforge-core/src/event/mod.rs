//! # Lifecycle Events
//!
//! A small event system the engine uses to tell the host what happened:
//! plugins loading and unloading, cycles being detected, generations being
//! swapped. Hosts register handlers by event name or by concrete event type
//! on the [`EventDispatcher`].

pub mod dispatcher;
pub mod types;

pub use dispatcher::{BoxFuture, EventDispatcher};
pub use types::EngineEvent;

#[cfg(test)]
mod tests;

use std::any::Any;

use async_trait::async_trait;

/// Identifier of a registered handler, for unregistration.
pub type EventId = u64;

/// Relative urgency of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// What a handler wants to happen to the rest of the handler chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Stop,
}

/// An event flowing through the dispatcher.
pub trait Event: Send + Sync {
    /// Stable dotted name, e.g. `plugin.loaded`.
    fn name(&self) -> &'static str;

    fn priority(&self) -> EventPriority {
        EventPriority::Normal
    }

    fn clone_event(&self) -> Box<dyn Event>;

    fn as_any(&self) -> &dyn Any;
}

/// Async handler invoked for matching events.
#[async_trait]
pub trait AsyncEventHandler: Send + Sync {
    async fn handle(&self, event: &dyn Event) -> EventResult;
}
