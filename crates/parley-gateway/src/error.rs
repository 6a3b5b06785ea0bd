//! Gateway error types

use crate::protocol::CloseCode;
use thiserror::Error;

/// Gateway error taxonomy
///
/// Recoverable kinds are handled inside the session manager; only
/// authentication rejection, fatal close codes, and reconnect exhaustion
/// reach the consumer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Socket-level failure; recovered by reconnecting
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Send attempted while the connection cannot carry frames
    #[error("Not connected")]
    NotConnected,

    /// Unparseable or unexpected frame; dropped, session continues
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Server went silent for a full heartbeat interval
    #[error("Heartbeat not acknowledged within one interval")]
    HeartbeatTimeout,

    /// Credential rejected during the handshake; never retried
    #[error("Authentication rejected by the remote end")]
    AuthenticationRejected,

    /// Session could not be resumed; recovered with a fresh handshake
    #[error("Resume rejected, session invalidated")]
    ResumeRejected,

    /// Remote closed with a code that forbids reconnecting
    #[error("Fatal close: {0}")]
    FatalClose(CloseCode),

    /// Configured reconnect attempt cap ran out
    #[error("Reconnect attempts exhausted after {attempts}")]
    ReconnectExhausted { attempts: u32 },
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
