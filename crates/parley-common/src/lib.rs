//! # parley-common
//!
//! Shared utilities: client configuration and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    ApiVersion, ClientConfig, ConfigError, ConnectionProperties, ReconnectPolicy, TokenType,
};
pub use telemetry::{LogFormat, TelemetryError};
