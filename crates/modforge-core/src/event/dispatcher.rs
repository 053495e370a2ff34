use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::event::{AsyncEventHandler, Event, EventId, EventResult};

/// An owned future returning an [`EventResult`].
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = EventResult> + Send + 'a>>;

/// Dispatches events to handlers registered by name or by concrete type.
pub struct EventDispatcher {
    handlers: HashMap<&'static str, Vec<(EventId, Box<dyn AsyncEventHandler>)>>,
    type_handlers: HashMap<TypeId, Vec<(EventId, Box<dyn AsyncEventHandler>)>>,
    next_handler_id: EventId,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_handler_count: usize = self.handlers.values().map(Vec::len).sum();
        let type_handler_count: usize = self.type_handlers.values().map(Vec::len).sum();
        f.debug_struct("EventDispatcher")
            .field("name_handlers_count", &name_handler_count)
            .field("type_handlers_count", &type_handler_count)
            .field("next_handler_id", &self.next_handler_id)
            .finish()
    }
}

/// Handler for events with a specific name.
struct SimpleHandler {
    handler: Box<dyn Fn(&dyn Event) -> BoxFuture<'_> + Send + Sync>,
}

impl fmt::Debug for SimpleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl AsyncEventHandler for SimpleHandler {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        (self.handler)(event).await
    }
}

/// Handler that downcasts to a concrete event type before invoking.
struct TypedEventHandler<E: Event + 'static> {
    handler: Box<dyn Fn(&E) -> BoxFuture<'_> + Send + Sync>,
}

impl<E: Event + 'static> fmt::Debug for TypedEventHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEventHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<E: Event + 'static> AsyncEventHandler for TypedEventHandler<E> {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        if let Some(e) = event.as_any().downcast_ref::<E>() {
            (self.handler)(e).await
        } else {
            EventResult::Continue
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            type_handlers: HashMap::new(),
            next_handler_id: 1,
        }
    }

    /// Registers a handler for all events with `event_name`.
    pub fn register_handler(
        &mut self,
        event_name: &'static str,
        handler: Box<dyn Fn(&dyn Event) -> BoxFuture<'_> + Send + Sync>,
    ) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        let handler = SimpleHandler { handler };
        self.handlers
            .entry(event_name)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Registers a handler for all events of concrete type `E`.
    pub fn register_type_handler<E: Event + 'static>(
        &mut self,
        handler: Box<dyn Fn(&E) -> BoxFuture<'_> + Send + Sync>,
    ) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        let type_id = TypeId::of::<E>();
        let handler = TypedEventHandler { handler };
        self.type_handlers
            .entry(type_id)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns whether anything was removed.
    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let mut found = false;
        self.handlers.values_mut().for_each(|handlers| {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            if handlers.len() < len_before {
                found = true;
            }
        });
        self.type_handlers.values_mut().for_each(|handlers| {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            if handlers.len() < len_before {
                found = true;
            }
        });
        found
    }

    /// Dispatches to name handlers first, then type handlers, stopping when
    /// a handler returns [`EventResult::Stop`].
    pub async fn dispatch(&self, event: &dyn Event) -> EventResult {
        if let Some(handlers) = self.handlers.get(event.name()) {
            for (_, handler) in handlers {
                if handler.handle(event).await == EventResult::Stop {
                    return EventResult::Stop;
                }
            }
        }
        if let Some(handlers) = self.type_handlers.get(&event.as_any().type_id()) {
            for (_, handler) in handlers {
                if handler.handle(event).await == EventResult::Stop {
                    return EventResult::Stop;
                }
            }
        }
        EventResult::Continue
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
