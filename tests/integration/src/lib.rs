//! Integration test utilities for the parley client
//!
//! Provides an in-process mock gateway server and helpers for driving a
//! client through handshake, heartbeat, and reconnect scenarios.

pub mod helpers;

pub use helpers::*;
