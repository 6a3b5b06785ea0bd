//! Dispatch enrichment hook
//!
//! A hook point between frame classification and event emission. The main
//! consumer is the resource cache, which substitutes the cached body of a
//! resource when a delete event carries only its id.

use serde_json::Value;

/// Hook invoked for every application dispatch before it is emitted.
///
/// The call is synchronous and runs on the frame-processing path, so
/// implementations must be cheap; anything slow belongs on the consumer side
/// of the event surface.
pub trait DispatchHook: Send + Sync {
    /// Inspect a dispatch payload before emission.
    ///
    /// Returning `Some` replaces the payload delivered to consumers;
    /// returning `None` passes the original through verbatim.
    fn on_dispatch(&self, event_type: &str, data: &Value) -> Option<Value>;
}

/// A hook that passes every payload through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl DispatchHook for NoopHook {
    fn on_dispatch(&self, _event_type: &str, _data: &Value) -> Option<Value> {
        None
    }
}
