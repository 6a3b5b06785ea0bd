//! Client aggregate
//!
//! One struct owns everything: configuration, REST client, resource cache,
//! and the gateway session manager. Components receive what they need by
//! reference at construction; there is no ambient global state.

use parley_cache::{CacheHook, ResourceCache};
use parley_common::ClientConfig;
use parley_gateway::protocol::PresenceUpdatePayload;
use parley_gateway::{
    ConnectionState, GatewayClient, GatewayCommander, GatewayError, GatewayEvent, Session,
};
use parley_http::{RestClient, RestError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Top-level client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// REST layer failure
    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    /// Gateway failure that reached the consumer
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// `connect` was called more than once
    #[error("Client is already connected")]
    AlreadyConnected,
}

/// The client aggregate
pub struct Client {
    rest: RestClient,
    cache: Arc<ResourceCache>,
    session: Arc<Session>,
    events: Arc<parley_gateway::EventBus>,
    commander: GatewayCommander,
    /// Taken by `connect`; present only before the first call
    gateway: Option<GatewayClient>,
}

impl Client {
    /// Build a client from configuration.
    ///
    /// The same credential drives both the REST Authorization header and the
    /// gateway Identify frame.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let rest = RestClient::new(&config)?;

        let cache = Arc::new(ResourceCache::new());
        let hook = Arc::new(CacheHook::new(cache.clone()));

        let gateway = GatewayClient::new(config).with_hook(hook);
        let session = gateway.session().clone();
        let events = gateway.events().clone();
        let commander = gateway.commander();

        Ok(Self {
            rest,
            cache,
            session,
            events,
            commander,
            gateway: Some(gateway),
        })
    }

    /// Subscribe to a single event type by its wire name
    pub fn subscribe(&self, event_type: impl Into<String>) -> mpsc::UnboundedReceiver<Value> {
        self.events.subscribe(event_type)
    }

    /// Subscribe to the full typed event stream
    pub fn events(&self) -> mpsc::UnboundedReceiver<GatewayEvent> {
        self.events.subscribe_all()
    }

    /// The authenticated REST capability
    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// A cloneable handle for commanding the gateway from other tasks
    #[must_use]
    pub fn commander(&self) -> GatewayCommander {
        self.commander.clone()
    }

    /// The resource cache maintained from the event stream
    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Current gateway connection state
    pub async fn state(&self) -> ConnectionState {
        self.session.state().await
    }

    /// Current session id, if a session is established
    pub async fn session_id(&self) -> Option<String> {
        self.session.session_id().await
    }

    /// Drive the gateway until shutdown or a terminal error.
    ///
    /// Subscriptions and the commander must be taken before calling this;
    /// it consumes the gateway and runs it in place.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        let gateway = self.gateway.take().ok_or(ClientError::AlreadyConnected)?;

        tracing::info!("Connecting to gateway");
        gateway.run().await?;

        Ok(())
    }

    /// Update the client's presence once the session is READY
    pub async fn update_presence(&self, presence: PresenceUpdatePayload) -> Result<(), ClientError> {
        self.commander.update_presence(presence).await?;
        Ok(())
    }

    /// Ask a running gateway to shut down cleanly
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.commander.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("cache_len", &self.cache.len())
            .finish()
    }
}
