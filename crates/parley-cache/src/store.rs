//! Resource cache storage
//!
//! Raw JSON payloads keyed by resource id. Payload shapes are defined by the
//! remote API and stored verbatim; the cache never models their fields.

use dashmap::DashMap;
use serde_json::Value;

/// In-memory store of resources observed on the gateway
#[derive(Debug, Default)]
pub struct ResourceCache {
    channels: DashMap<String, Value>,
    guilds: DashMap<String, Value>,
    roles: DashMap<String, Value>,
    messages: DashMap<String, Value>,
    /// Keyed by (guild id, user id)
    members: DashMap<(String, String), Value>,
    scheduled_events: DashMap<String, Value>,
}

/// Pull the `id` field out of a resource payload
fn payload_id(payload: &Value) -> Option<String> {
    payload.get("id").and_then(Value::as_str).map(String::from)
}

impl ResourceCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Channels (threads share the channel family) ===

    /// Insert or update a channel payload, keyed by its `id`
    pub fn insert_channel(&self, payload: &Value) {
        if let Some(id) = payload_id(payload) {
            self.channels.insert(id, payload.clone());
        }
    }

    /// Get a channel payload by id
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<Value> {
        self.channels.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a channel, returning the cached payload if present
    pub fn remove_channel(&self, id: &str) -> Option<Value> {
        self.channels.remove(id).map(|(_, payload)| payload)
    }

    // === Guilds ===

    /// Insert or update a guild payload, keyed by its `id`
    pub fn insert_guild(&self, payload: &Value) {
        if let Some(id) = payload_id(payload) {
            self.guilds.insert(id, payload.clone());
        }
    }

    /// Get a guild payload by id
    #[must_use]
    pub fn guild(&self, id: &str) -> Option<Value> {
        self.guilds.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a guild, returning the cached payload if present
    pub fn remove_guild(&self, id: &str) -> Option<Value> {
        self.guilds.remove(id).map(|(_, payload)| payload)
    }

    // === Roles ===

    /// Insert or update a role payload, keyed by its `id`
    pub fn insert_role(&self, payload: &Value) {
        if let Some(id) = payload_id(payload) {
            self.roles.insert(id, payload.clone());
        }
    }

    /// Get a role payload by id
    #[must_use]
    pub fn role(&self, id: &str) -> Option<Value> {
        self.roles.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a role, returning the cached payload if present
    pub fn remove_role(&self, id: &str) -> Option<Value> {
        self.roles.remove(id).map(|(_, payload)| payload)
    }

    // === Messages ===

    /// Insert or update a message payload, keyed by its `id`
    pub fn insert_message(&self, payload: &Value) {
        if let Some(id) = payload_id(payload) {
            self.messages.insert(id, payload.clone());
        }
    }

    /// Get a message payload by id
    #[must_use]
    pub fn message(&self, id: &str) -> Option<Value> {
        self.messages.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a message, returning the cached payload if present
    pub fn remove_message(&self, id: &str) -> Option<Value> {
        self.messages.remove(id).map(|(_, payload)| payload)
    }

    // === Members ===

    /// Insert or update a member payload, keyed by guild id and the nested
    /// `user.id`
    pub fn insert_member(&self, guild_id: &str, payload: &Value) {
        let user_id = payload
            .get("user")
            .and_then(|user| user.get("id"))
            .and_then(Value::as_str);

        if let Some(user_id) = user_id {
            self.members
                .insert((guild_id.to_string(), user_id.to_string()), payload.clone());
        }
    }

    /// Get a member payload by guild and user id
    #[must_use]
    pub fn member(&self, guild_id: &str, user_id: &str) -> Option<Value> {
        self.members
            .get(&(guild_id.to_string(), user_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Remove a member, returning the cached payload if present
    pub fn remove_member(&self, guild_id: &str, user_id: &str) -> Option<Value> {
        self.members
            .remove(&(guild_id.to_string(), user_id.to_string()))
            .map(|(_, payload)| payload)
    }

    // === Scheduled events ===

    /// Insert or update a scheduled event payload, keyed by its `id`
    pub fn insert_scheduled_event(&self, payload: &Value) {
        if let Some(id) = payload_id(payload) {
            self.scheduled_events.insert(id, payload.clone());
        }
    }

    /// Get a scheduled event payload by id
    #[must_use]
    pub fn scheduled_event(&self, id: &str) -> Option<Value> {
        self.scheduled_events
            .get(id)
            .map(|entry| entry.value().clone())
    }

    /// Remove a scheduled event, returning the cached payload if present
    pub fn remove_scheduled_event(&self, id: &str) -> Option<Value> {
        self.scheduled_events.remove(id).map(|(_, payload)| payload)
    }

    /// Total number of cached resources across all families
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
            + self.guilds.len()
            + self.roles.len()
            + self.messages.len()
            + self.members.len()
            + self.scheduled_events.len()
    }

    /// Whether the cache holds no resources
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached resource
    pub fn clear(&self) {
        self.channels.clear();
        self.guilds.clear();
        self.roles.clear();
        self.messages.clear();
        self.members.clear();
        self.scheduled_events.clear();
    }
}
