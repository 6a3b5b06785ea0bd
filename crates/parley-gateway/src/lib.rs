//! # parley-gateway
//!
//! The gateway session manager: owns the persistent duplex connection to the
//! platform, performs the identify/resume handshake, maintains liveness via
//! heartbeats, and resumes sessions after a drop without losing events.

pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod handshake;
pub mod heartbeat;
pub mod protocol;
pub mod router;
pub mod session;

pub use client::{GatewayClient, GatewayCommander};
pub use connection::{ConnectionHandle, FrameSender, InboundEvent};
pub use error::{GatewayError, GatewayResult};
pub use events::{EventBus, GatewayEvent};
pub use handshake::HandshakeSequencer;
pub use heartbeat::{ControlSignal, HeartbeatMonitor};
pub use router::{DispatchRouter, RouteAction};
pub use session::{ConnectionState, Session};
