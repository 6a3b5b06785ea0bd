//! Cache maintenance dispatch hook
//!
//! Keeps the resource cache current from the event stream and enriches
//! deletion events. Delete payloads carry only ids; consumers get the full
//! cached body when one is available.

use crate::store::ResourceCache;
use parley_core::{DispatchEventType, DispatchHook};
use serde_json::Value;
use std::sync::Arc;

/// Dispatch hook backed by a [`ResourceCache`]
#[derive(Debug, Clone)]
pub struct CacheHook {
    cache: Arc<ResourceCache>,
}

impl CacheHook {
    /// Create a hook over a shared cache
    #[must_use]
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self { cache }
    }

    /// The cache this hook maintains
    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }
}

fn str_field<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

impl DispatchHook for CacheHook {
    fn on_dispatch(&self, event_type: &str, data: &Value) -> Option<Value> {
        use DispatchEventType as E;

        let event = E::from_str(event_type)?;

        match event {
            E::ChannelCreate | E::ChannelUpdate | E::ThreadCreate | E::ThreadUpdate => {
                self.cache.insert_channel(data);
                None
            }
            E::ChannelDelete | E::ThreadDelete => {
                let cached = str_field(data, "id").and_then(|id| self.cache.remove_channel(id));
                if cached.is_some() {
                    tracing::trace!(event_type = %event_type, "Substituted cached channel body");
                }
                cached
            }

            E::GuildCreate | E::GuildUpdate => {
                self.cache.insert_guild(data);
                None
            }
            E::GuildDelete => str_field(data, "id").and_then(|id| self.cache.remove_guild(id)),

            // Role events nest the role under a guild envelope
            E::GuildRoleCreate | E::GuildRoleUpdate => {
                if let Some(role) = data.get("role") {
                    self.cache.insert_role(role);
                }
                None
            }
            E::GuildRoleDelete => {
                if let Some(role_id) = str_field(data, "role_id") {
                    self.cache.remove_role(role_id);
                }
                None
            }

            E::MessageCreate | E::MessageUpdate => {
                self.cache.insert_message(data);
                None
            }
            E::MessageDelete => str_field(data, "id").and_then(|id| self.cache.remove_message(id)),

            E::GuildMemberAdd | E::GuildMemberUpdate => {
                if let Some(guild_id) = str_field(data, "guild_id") {
                    self.cache.insert_member(guild_id, data);
                }
                None
            }
            E::GuildMemberRemove => {
                let guild_id = str_field(data, "guild_id")?;
                let user_id = data
                    .get("user")
                    .and_then(|user| user.get("id"))
                    .and_then(Value::as_str)?;
                self.cache.remove_member(guild_id, user_id)
            }

            E::GuildScheduledEventCreate | E::GuildScheduledEventUpdate => {
                self.cache.insert_scheduled_event(data);
                None
            }
            E::GuildScheduledEventDelete => {
                str_field(data, "id").and_then(|id| self.cache.remove_scheduled_event(id))
            }

            // Session and presence events carry no cacheable resource
            E::Ready | E::Resumed | E::PresenceUpdate | E::TypingStart => None,
        }
    }
}
