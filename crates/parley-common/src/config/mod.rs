//! Configuration structs

mod client_config;

pub use client_config::{
    ApiVersion, ClientConfig, ConfigError, ConnectionProperties, ReconnectPolicy, TokenType,
};
