//! # parley
//!
//! A client library for a chat-platform API. Maintains a persistent gateway
//! connection for real-time events and issues authenticated HTTP requests
//! against the platform's REST API.
//!
//! ```no_run
//! use parley::{Client, ClientConfig, Intents};
//!
//! # async fn example() -> Result<(), parley::ClientError> {
//! let config = ClientConfig::new("my-token")
//!     .with_intents(Intents::GUILDS | Intents::GUILD_MESSAGES);
//!
//! let mut client = Client::new(config)?;
//! let mut messages = client.subscribe("MESSAGE_CREATE");
//!
//! tokio::spawn(async move {
//!     while let Some(message) = messages.recv().await {
//!         println!("message: {message}");
//!     }
//! });
//!
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{Client, ClientError};

// Re-export the crates that make up the public surface
pub use parley_cache::{CacheHook, ResourceCache};
pub use parley_common::{
    ApiVersion, ClientConfig, ConnectionProperties, ReconnectPolicy, TokenType,
};
pub use parley_core::{DispatchEventType, DispatchHook, Intents};
pub use parley_gateway::protocol::PresenceUpdatePayload;
pub use parley_gateway::{ConnectionState, GatewayCommander, GatewayError, GatewayEvent};
pub use parley_http::{Method, RestClient, RestError};
