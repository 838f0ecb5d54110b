//! In-process pub/sub bus with concurrent fan-out and error isolation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;

use crate::event::DomainEvent;

/// An event subscriber.
///
/// Handlers may suspend; the bus awaits them. A failing handler is logged and
/// never affects the publisher or its sibling handlers.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: &E) -> anyhow::Result<()>;

    /// Short name used in log lines when the handler fails.
    fn name(&self) -> &str {
        "handler"
    }
}

/// In-memory topic bus.
///
/// Subscriptions are keyed by event tag. `publish` snapshots the topic's
/// handler list under the lock, releases it, then invokes every handler
/// concurrently and awaits the whole fan-out. Completion of `publish` means
/// every handler returned or failed, not that every handler succeeded.
///
/// No ordering guarantee across topics; within a topic, handler invocation
/// order is unspecified.
pub struct EventBus<E> {
    subscribers: Mutex<HashMap<String, Vec<Arc<dyn EventHandler<E>>>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

impl<E: DomainEvent> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a topic (event tag).
    pub fn subscribe(&self, topic: impl Into<String>, handler: Arc<dyn EventHandler<E>>) {
        let topic = topic.into();
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(topic = %topic, handler = handler.name(), "subscribed");
        subs.entry(topic).or_default().push(handler);
    }

    /// Remove one registration of `handler` under `topic` (pointer identity).
    pub fn unsubscribe(&self, topic: &str, handler: &Arc<dyn EventHandler<E>>) {
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handlers) = subs.get_mut(topic) {
            if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
                handlers.remove(pos);
                tracing::debug!(topic = %topic, handler = handler.name(), "unsubscribed");
            }
        }
    }

    /// Publish an event to every handler subscribed under its tag.
    ///
    /// Handlers run concurrently; the call returns once all of them have
    /// completed. Failures are logged and swallowed.
    pub async fn publish(&self, event: &E) {
        let topic = event.event_type();

        let handlers: Vec<Arc<dyn EventHandler<E>>> = {
            let subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subs.get(topic).cloned().unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::debug!(topic = %topic, "no handlers for event");
            return;
        }

        tracing::debug!(topic = %topic, handlers = handlers.len(), "publishing event");

        let results = join_all(handlers.iter().map(|h| h.handle(event))).await;
        for (handler, result) in handlers.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(
                    topic = %topic,
                    handler = handler.name(),
                    error = %e,
                    "event handler failed"
                );
            }
        }
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.clear();
        tracing::debug!("cleared all event bus subscriptions");
    }

    /// Number of handlers registered under `topic`, or across all topics.
    pub fn handler_count(&self, topic: Option<&str>) -> usize {
        let subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        match topic {
            Some(t) => subs.get(t).map(Vec::len).unwrap_or(0),
            None => subs.values().map(Vec::len).sum(),
        }
    }
}
