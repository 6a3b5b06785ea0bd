//! Dispatch router
//!
//! Classifies inbound frames by opcode. State updates (sequence, ack flag,
//! session identity) happen here; anything requiring the connection or the
//! timer is returned as an action for the coordinator to execute.

use crate::events::EventBus;
use crate::protocol::{GatewayMessage, OpCode};
use crate::session::{ConnectionState, Session};
use parley_core::DispatchHook;
use serde_json::Value;
use std::sync::Arc;

/// What the coordinator must do after a frame was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Nothing; the frame was fully handled
    None,
    /// Server requested an immediate heartbeat
    SendHeartbeat,
    /// Hello arrived: start the heartbeat timer and run the handshake
    BeginHandshake { heartbeat_interval: u64 },
    /// Cycle the connection; `resumable` says whether the session survives
    Reconnect { resumable: bool },
}

/// Inbound frame classifier
pub struct DispatchRouter {
    session: Arc<Session>,
    events: Arc<EventBus>,
    hook: Arc<dyn DispatchHook>,
}

impl DispatchRouter {
    /// Create a router over the shared session, event surface, and hook
    pub fn new(session: Arc<Session>, events: Arc<EventBus>, hook: Arc<dyn DispatchHook>) -> Self {
        Self {
            session,
            events,
            hook,
        }
    }

    /// Classify one inbound frame
    pub async fn route(&self, message: GatewayMessage) -> RouteAction {
        tracing::trace!(op = %message.op, t = ?message.t, s = ?message.s, "Routing frame");

        // Every frame that carries a sequence number advances the counter
        if let Some(seq) = message.s {
            if !self.session.observe_sequence(seq).await {
                tracing::debug!(seq, "Ignoring stale sequence number");
            }
        }

        match message.op {
            OpCode::HeartbeatAck => {
                self.session.ack_heartbeat();
                RouteAction::None
            }

            // The server may request a beat outside the regular cadence
            OpCode::Heartbeat => RouteAction::SendHeartbeat,

            OpCode::Hello => match message.as_hello() {
                Some(hello) => {
                    self.session
                        .set_heartbeat_interval(hello.heartbeat_interval)
                        .await;
                    // A fresh connection starts with a clean ack slate
                    self.session.ack_heartbeat();

                    tracing::info!(
                        heartbeat_interval = hello.heartbeat_interval,
                        "Hello received"
                    );

                    RouteAction::BeginHandshake {
                        heartbeat_interval: hello.heartbeat_interval,
                    }
                }
                None => {
                    tracing::warn!("Dropping Hello frame with malformed payload");
                    RouteAction::None
                }
            },

            OpCode::Reconnect => {
                tracing::info!("Server requested reconnect");
                RouteAction::Reconnect { resumable: true }
            }

            OpCode::InvalidSession => {
                let resumable = message.invalid_session_resumable().unwrap_or(false);
                tracing::warn!(resumable, "Server invalidated the session");
                RouteAction::Reconnect { resumable }
            }

            OpCode::Dispatch => {
                self.route_dispatch(message).await;
                RouteAction::None
            }

            // Client-only opcodes coming back at us are a protocol violation
            OpCode::Identify | OpCode::Resume | OpCode::PresenceUpdate => {
                tracing::warn!(op = %message.op, "Dropping client-only opcode sent by server");
                RouteAction::None
            }
        }
    }

    /// Handle an application dispatch: session confirmations update state,
    /// everything else flows to the event surface
    async fn route_dispatch(&self, message: GatewayMessage) {
        let Some(event_type) = message.t.clone() else {
            tracing::warn!("Dropping dispatch frame without an event type");
            return;
        };

        if let Some(ready) = message.as_ready() {
            self.session.set_session_id(ready.session_id.clone()).await;
            self.session.set_state(ConnectionState::Ready).await;

            tracing::info!(session_id = %ready.session_id, "Session ready");

            self.events
                .emit_ready(ready.session_id, message.d.unwrap_or(Value::Null));
            return;
        }

        if message.is_resumed() {
            self.session.set_state(ConnectionState::Ready).await;

            tracing::info!("Session resumed");

            self.events.emit_resumed();
            return;
        }

        let data = message.d.unwrap_or(Value::Null);

        // Synchronous hook point: the cache may substitute an enriched body
        let data = match self.hook.on_dispatch(&event_type, &data) {
            Some(enriched) => enriched,
            None => data,
        };

        self.events.emit_dispatch(&event_type, data);
    }
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter").finish()
    }
}
