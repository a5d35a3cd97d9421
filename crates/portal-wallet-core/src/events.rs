//! Instance-owned event bus
//!
//! A minimal publish/subscribe registry used by the provider and the session
//! layer to decouple callers from internal state transitions. Each stateful
//! component owns its own bus, so tests can instantiate independent instances
//! without cross-talk.
//!
//! Events are fire-and-forget broadcasts: handlers must be registered at emit
//! time, there is no queue. Callers needing a request/response contract use a
//! `once` handler keyed to a correlation id embedded in the payload.

use dashmap::DashMap;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Well-known event names shared across components
pub mod event {
    /// First successful request after cold start, or transport session open
    pub const CONNECT: &str = "connect";
    /// Explicit disconnect or abnormal transport close
    pub const DISCONNECT: &str = "disconnect";
    /// The active chain cursor moved
    pub const CHAIN_CHANGED: &str = "chainChanged";
}

/// Boxed event handler
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Opaque handle identifying a single subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionId {
    event: String,
    id: Uuid,
}

impl SubscriptionId {
    /// Name of the event this subscription is registered for
    pub fn event(&self) -> &str {
        &self.event
    }
}

struct Listener {
    id: Uuid,
    once: bool,
    handler: EventHandler,
}

/// Typed publish/subscribe registry
///
/// `emit` invokes all current handlers for the event name in registration
/// order, synchronously on the calling task. A handler that panics is
/// isolated and logged; subsequent handlers still run. `once` handlers are
/// deregistered before invocation, so a re-entrant `emit` for the same event
/// cannot fire them twice.
pub struct EventBus {
    listeners: DashMap<String, Vec<Listener>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Register a handler for every emission of `event`
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), false)
    }

    /// Register a handler that fires at most once
    pub fn once<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), true)
    }

    fn register(&self, event: &str, handler: EventHandler, once: bool) -> SubscriptionId {
        let id = Uuid::new_v4();
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, once, handler });

        SubscriptionId {
            event: event.to_string(),
            id,
        }
    }

    /// Remove a subscription; a stale id is a no-op
    pub fn off(&self, subscription: &SubscriptionId) {
        if let Some(mut entry) = self.listeners.get_mut(&subscription.event) {
            entry.retain(|listener| listener.id != subscription.id);
        }
    }

    /// Broadcast a payload to all current handlers for `event`
    pub fn emit(&self, event: &str, payload: Value) {
        // Snapshot handlers and drop the shard guard before invoking anything:
        // handlers may re-enter the bus (emit, on, off) for the same event.
        // Once-handlers leave the registry as part of the snapshot, so a
        // re-entrant emit cannot fire them again.
        let snapshot: Vec<EventHandler> = match self.listeners.get_mut(event) {
            Some(mut entry) => {
                let handlers = entry
                    .iter()
                    .map(|listener| Arc::clone(&listener.handler))
                    .collect();
                entry.retain(|listener| !listener.once);
                handlers
            }
            None => return,
        };

        for handler in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(&payload)));
            if result.is_err() {
                error!(event, "event handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Number of handlers currently registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .get(event)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
