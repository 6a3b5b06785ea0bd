//! Handshake sequencer
//!
//! Decides identify versus resume when the server's Hello arrives. A resume
//! is attempted only when both the session identity and a sequence number
//! survived the previous connection.

use crate::connection::FrameSender;
use crate::error::GatewayResult;
use crate::protocol::{GatewayMessage, IdentifyPayload, IdentifyProperties, ResumePayload};
use crate::session::{ConnectionState, Session};
use parley_common::ClientConfig;
use parley_core::Intents;
use std::sync::Arc;

/// Drives the identify-or-resume exchange
pub struct HandshakeSequencer {
    token: String,
    intents: Intents,
    properties: IdentifyProperties,
}

impl HandshakeSequencer {
    /// Build a sequencer from the client configuration
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            token: config.token.clone(),
            intents: config.intents,
            properties: IdentifyProperties::from(&config.properties),
        }
    }

    /// Send the appropriate handshake frame for the session's state.
    ///
    /// READY / RESUMED confirmations are handled by the router; this only
    /// chooses and sends the opening frame.
    pub async fn begin(&self, session: &Arc<Session>, sender: &FrameSender) -> GatewayResult<()> {
        if session.is_resumable().await {
            // is_resumable guarantees both fields are present
            let session_id = session.session_id().await.unwrap_or_default();
            let seq = session.sequence().await.unwrap_or_default();

            session.set_state(ConnectionState::Resuming).await;

            tracing::info!(session_id = %session_id, seq, "Resuming prior session");

            sender
                .send(GatewayMessage::resume(&ResumePayload {
                    token: self.token.clone(),
                    session_id,
                    seq,
                }))
                .await
        } else {
            session.set_state(ConnectionState::Identifying).await;

            tracing::info!(intents = %self.intents, "Identifying new session");

            sender
                .send(GatewayMessage::identify(&IdentifyPayload {
                    token: self.token.clone(),
                    properties: self.properties.clone(),
                    intents: self.intents,
                }))
                .await
        }
    }
}

impl std::fmt::Debug for HandshakeSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token stays out of debug output
        f.debug_struct("HandshakeSequencer")
            .field("intents", &self.intents)
            .finish()
    }
}
