//! Session state
//!
//! The single shared record of session identity and liveness. Both the
//! frame-routing path and the heartbeat timer update it, so every field is
//! individually synchronized; no component owns a private copy.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No transport
    Disconnected,
    /// Transport being established
    Connecting,
    /// Transport up, waiting for the server's Hello
    AwaitingHello,
    /// Identify sent, waiting for READY
    Identifying,
    /// Resume sent, waiting for RESUMED
    Resuming,
    /// Session established, events flowing
    Ready,
    /// Transport being torn down
    Closing,
}

/// Shared session state for one gateway client
pub struct Session {
    /// Server-issued session identity (None until the first READY)
    session_id: RwLock<Option<String>>,

    /// Last observed sequence number, monotonically non-decreasing
    sequence: RwLock<Option<u64>>,

    /// Server-dictated heartbeat interval in milliseconds
    heartbeat_interval: RwLock<Option<u64>>,

    /// Whether the last heartbeat was acknowledged
    heartbeat_acked: AtomicBool,

    /// Current connection state
    state: RwLock<ConnectionState>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session_id: RwLock::new(None),
            sequence: RwLock::new(None),
            heartbeat_interval: RwLock::new(None),
            heartbeat_acked: AtomicBool::new(true),
            state: RwLock::new(ConnectionState::Disconnected),
        })
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Set the connection state
    pub async fn set_state(&self, state: ConnectionState) {
        let mut guard = self.state.write().await;
        if *guard != state {
            tracing::debug!(from = ?*guard, to = ?state, "Connection state transition");
            *guard = state;
        }
    }

    /// Get the session ID, if one has been issued
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    /// Record the session ID from a handshake confirmation
    pub async fn set_session_id(&self, session_id: String) {
        *self.session_id.write().await = Some(session_id);
    }

    /// Get the last observed sequence number
    pub async fn sequence(&self) -> Option<u64> {
        *self.sequence.read().await
    }

    /// Observe a sequence number from an inbound frame.
    ///
    /// Updates are monotonic: a value not larger than the stored one is
    /// rejected and `false` is returned. The transport preserves order, so
    /// rejection indicates a misbehaving server rather than an expected path.
    pub async fn observe_sequence(&self, seq: u64) -> bool {
        let mut guard = self.sequence.write().await;
        match *guard {
            Some(current) if seq <= current => false,
            _ => {
                *guard = Some(seq);
                true
            }
        }
    }

    /// Get the heartbeat interval, if the server has dictated one
    pub async fn heartbeat_interval(&self) -> Option<u64> {
        *self.heartbeat_interval.read().await
    }

    /// Record the server-dictated heartbeat interval
    pub async fn set_heartbeat_interval(&self, interval_ms: u64) {
        *self.heartbeat_interval.write().await = Some(interval_ms);
    }

    /// Check if the last heartbeat was acknowledged
    pub fn is_heartbeat_acked(&self) -> bool {
        self.heartbeat_acked.load(Ordering::SeqCst)
    }

    /// Mark the last heartbeat as acknowledged
    pub fn ack_heartbeat(&self) {
        self.heartbeat_acked.store(true, Ordering::SeqCst);
    }

    /// Mark a heartbeat as sent and awaiting acknowledgement
    pub fn await_heartbeat_ack(&self) {
        self.heartbeat_acked.store(false, Ordering::SeqCst);
    }

    /// Whether a resume may be attempted: both the session identity and a
    /// sequence number must be present
    pub async fn is_resumable(&self) -> bool {
        self.session_id.read().await.is_some() && self.sequence.read().await.is_some()
    }

    /// Discard the session identity so the next handshake is a fresh
    /// Identify. The heartbeat interval is also dropped; the next Hello
    /// dictates a new one.
    pub async fn invalidate(&self) {
        let old = self.session_id.write().await.take();
        *self.sequence.write().await = None;
        *self.heartbeat_interval.write().await = None;
        self.heartbeat_acked.store(true, Ordering::SeqCst);

        if let Some(session_id) = old {
            tracing::info!(session_id = %session_id, "Session invalidated");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("heartbeat_acked", &self.is_heartbeat_acked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_session() {
        let session = Session::new();

        assert_eq!(session.state().await, ConnectionState::Disconnected);
        assert!(session.session_id().await.is_none());
        assert!(session.sequence().await.is_none());
        assert!(session.heartbeat_interval().await.is_none());
        assert!(session.is_heartbeat_acked());
        assert!(!session.is_resumable().await);
    }

    #[tokio::test]
    async fn test_sequence_is_monotonic() {
        let session = Session::new();

        assert!(session.observe_sequence(5).await);
        assert!(session.observe_sequence(7).await);

        // Stale and duplicate values are rejected
        assert!(!session.observe_sequence(6).await);
        assert!(!session.observe_sequence(7).await);

        assert_eq!(session.sequence().await, Some(7));
    }

    #[tokio::test]
    async fn test_resumable_requires_both_fields() {
        let session = Session::new();
        assert!(!session.is_resumable().await);

        session.set_session_id("abc".to_string()).await;
        assert!(!session.is_resumable().await);

        session.observe_sequence(1).await;
        assert!(session.is_resumable().await);
    }

    #[tokio::test]
    async fn test_invalidate_clears_identity() {
        let session = Session::new();
        session.set_session_id("abc".to_string()).await;
        session.observe_sequence(42).await;
        session.set_heartbeat_interval(30_000).await;
        session.await_heartbeat_ack();

        session.invalidate().await;

        assert!(session.session_id().await.is_none());
        assert!(session.sequence().await.is_none());
        assert!(session.heartbeat_interval().await.is_none());
        assert!(session.is_heartbeat_acked());
        assert!(!session.is_resumable().await);
    }

    #[tokio::test]
    async fn test_heartbeat_ack_flag() {
        let session = Session::new();
        assert!(session.is_heartbeat_acked());

        session.await_heartbeat_ack();
        assert!(!session.is_heartbeat_acked());

        session.ack_heartbeat();
        assert!(session.is_heartbeat_acked());
    }
}
