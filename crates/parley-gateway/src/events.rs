//! Public event surface
//!
//! Consumers subscribe either by event-type string (the open map, shapes
//! defined by the evolving remote API) or to the full typed stream (the
//! closed set of things the gateway itself knows about). Delivery is
//! in-order for the lifetime of a READY session; readiness is re-announced
//! after every successful resume.

use crate::error::GatewayError;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;

/// Events the gateway itself emits
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Session established; the only signal that the session is usable
    Ready { session_id: String, data: Value },
    /// A dropped session was reattached without event loss
    Resumed,
    /// An application event, forwarded verbatim (or cache-enriched)
    Dispatch { event_type: String, data: Value },
    /// Terminal failure; no further events will follow
    Closed { error: GatewayError },
}

/// Subscription registry and emitter
#[derive(Debug, Default)]
pub struct EventBus {
    /// Per-event-type subscribers, keyed by wire name
    by_type: DashMap<String, Vec<mpsc::UnboundedSender<Value>>>,
    /// Subscribers to the full typed stream
    all: RwLock<Vec<mpsc::UnboundedSender<GatewayEvent>>>,
}

impl EventBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a single event type by its wire name.
    ///
    /// READY and RESUMED are delivered here too, so a consumer can watch
    /// session readiness without taking the whole stream.
    pub fn subscribe(&self, event_type: impl Into<String>) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.by_type.entry(event_type.into()).or_default().push(tx);
        rx
    }

    /// Subscribe to every gateway event
    pub fn subscribe_all(&self) -> mpsc::UnboundedReceiver<GatewayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.all.write().push(tx);
        rx
    }

    /// Emit an application dispatch
    pub fn emit_dispatch(&self, event_type: &str, data: Value) {
        self.emit_typed(event_type, &data);
        self.emit_all(GatewayEvent::Dispatch {
            event_type: event_type.to_string(),
            data,
        });
    }

    /// Announce readiness after a successful identify
    pub fn emit_ready(&self, session_id: String, data: Value) {
        self.emit_typed("READY", &data);
        self.emit_all(GatewayEvent::Ready { session_id, data });
    }

    /// Announce reattachment after a successful resume
    pub fn emit_resumed(&self) {
        self.emit_typed("RESUMED", &Value::Null);
        self.emit_all(GatewayEvent::Resumed);
    }

    /// Announce a terminal failure
    pub fn emit_closed(&self, error: GatewayError) {
        self.emit_all(GatewayEvent::Closed { error });
    }

    /// Number of live per-type subscriptions for an event type
    #[must_use]
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, |entry| entry.len())
    }

    fn emit_typed(&self, event_type: &str, data: &Value) {
        if let Some(mut subscribers) = self.by_type.get_mut(event_type) {
            // Dropped receivers are pruned as they are discovered
            subscribers.retain(|tx| tx.send(data.clone()).is_ok());
        }
    }

    fn emit_all(&self, event: GatewayEvent) {
        self.all.write().retain(|tx| tx.send(event.clone()).is_ok());
    }
}
