//! Gateway payload definitions
//!
//! Structures carried in the `d` field of gateway frames. Client-sent
//! payloads are built here; server-sent ones are parsed from dispatch data.

use parley_common::ConnectionProperties;
use parley_core::Intents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of op 10 (Hello)
///
/// First frame the server sends; dictates the heartbeat cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Connection properties reported when identifying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl From<&ConnectionProperties> for IdentifyProperties {
    fn from(props: &ConnectionProperties) -> Self {
        Self {
            os: props.os.clone(),
            browser: props.browser.clone(),
            device: props.device.clone(),
        }
    }
}

/// Payload of op 2 (Identify)
///
/// Authenticates a brand-new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Authentication token, the same credential the REST client sends
    pub token: String,

    /// Client properties
    pub properties: IdentifyProperties,

    /// Declared event categories
    pub intents: Intents,
}

/// Payload of op 6 (Resume)
///
/// Reattaches to a prior session; the server replays events after `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Authentication token
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}

/// Payload of op 3 (Presence Update)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Unix time (ms) the client went idle, or null
    pub since: Option<u64>,

    /// Activities the client is engaged in, shapes defined by the remote API
    pub activities: Vec<Value>,

    /// New status (online, idle, dnd, invisible, offline)
    pub status: String,

    /// Whether the client is AFK
    pub afk: bool,
}

impl PresenceUpdatePayload {
    /// A plain status change with no activities
    #[must_use]
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            since: None,
            activities: Vec::new(),
            status: status.into(),
            afk: false,
        }
    }
}

/// The slice of the READY dispatch this library reads
///
/// READY carries much more (user, guilds, application); everything else is
/// forwarded to consumers verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    /// Server-issued session identity, required to resume later
    pub session_id: String,
}
