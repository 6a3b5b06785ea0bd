//! Gateway intents bitflags
//!
//! Declares which event categories the client wishes to receive.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

bitflags! {
    /// Gateway intent flags
    ///
    /// Sent as an integer bitmask in the Identify payload. Events belonging to
    /// categories the client did not declare are never delivered. The default
    /// is the empty mask.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        /// Guild create/update/delete and role/channel lifecycle
        const GUILDS                    = 1 << 0;
        /// Member add/update/remove
        const GUILD_MEMBERS             = 1 << 1;
        /// Ban add/remove
        const GUILD_BANS                = 1 << 2;
        /// Emoji and sticker updates
        const GUILD_EMOJIS_AND_STICKERS = 1 << 3;
        /// Integration updates
        const GUILD_INTEGRATIONS        = 1 << 4;
        /// Webhook updates
        const GUILD_WEBHOOKS            = 1 << 5;
        /// Invite create/delete
        const GUILD_INVITES             = 1 << 6;
        /// Voice state updates
        const GUILD_VOICE_STATES        = 1 << 7;
        /// Presence updates
        const GUILD_PRESENCES           = 1 << 8;
        /// Messages in guild channels
        const GUILD_MESSAGES            = 1 << 9;
        /// Reactions in guild channels
        const GUILD_MESSAGE_REACTIONS   = 1 << 10;
        /// Typing notifications in guild channels
        const GUILD_MESSAGE_TYPING      = 1 << 11;
        /// Direct messages
        const DIRECT_MESSAGES           = 1 << 12;
        /// Reactions in direct messages
        const DIRECT_MESSAGE_REACTIONS  = 1 << 13;
        /// Typing notifications in direct messages
        const DIRECT_MESSAGE_TYPING     = 1 << 14;
        /// Scheduled event lifecycle
        const GUILD_SCHEDULED_EVENTS    = 1 << 16;
    }
}

/// Error returned when an intent name cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown intent: {0}")]
pub struct IntentsParseError(pub String);

impl Intents {
    /// Parse a single intent by its SCREAMING_SNAKE_CASE name
    pub fn parse_name(name: &str) -> Result<Self, IntentsParseError> {
        match name {
            "GUILDS" => Ok(Self::GUILDS),
            "GUILD_MEMBERS" => Ok(Self::GUILD_MEMBERS),
            "GUILD_BANS" => Ok(Self::GUILD_BANS),
            "GUILD_EMOJIS_AND_STICKERS" => Ok(Self::GUILD_EMOJIS_AND_STICKERS),
            "GUILD_INTEGRATIONS" => Ok(Self::GUILD_INTEGRATIONS),
            "GUILD_WEBHOOKS" => Ok(Self::GUILD_WEBHOOKS),
            "GUILD_INVITES" => Ok(Self::GUILD_INVITES),
            "GUILD_VOICE_STATES" => Ok(Self::GUILD_VOICE_STATES),
            "GUILD_PRESENCES" => Ok(Self::GUILD_PRESENCES),
            "GUILD_MESSAGES" => Ok(Self::GUILD_MESSAGES),
            "GUILD_MESSAGE_REACTIONS" => Ok(Self::GUILD_MESSAGE_REACTIONS),
            "GUILD_MESSAGE_TYPING" => Ok(Self::GUILD_MESSAGE_TYPING),
            "DIRECT_MESSAGES" => Ok(Self::DIRECT_MESSAGES),
            "DIRECT_MESSAGE_REACTIONS" => Ok(Self::DIRECT_MESSAGE_REACTIONS),
            "DIRECT_MESSAGE_TYPING" => Ok(Self::DIRECT_MESSAGE_TYPING),
            "GUILD_SCHEDULED_EVENTS" => Ok(Self::GUILD_SCHEDULED_EVENTS),
            other => Err(IntentsParseError(other.to_string())),
        }
    }

    /// Combine a list of intent names into a single bitmask
    pub fn from_names<I, S>(names: I) -> Result<Self, IntentsParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut combined = Self::empty();
        for name in names {
            combined |= Self::parse_name(name.as_ref())?;
        }
        Ok(combined)
    }

    /// Get the raw bitmask value sent over the wire
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.bits()
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_bits() {
        assert_eq!(Intents::GUILDS.as_u64(), 1);
        assert_eq!(Intents::GUILD_MESSAGES.as_u64(), 1 << 9);
        assert_eq!(Intents::GUILD_SCHEDULED_EVENTS.as_u64(), 1 << 16);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(Intents::parse_name("GUILDS"), Ok(Intents::GUILDS));
        assert_eq!(
            Intents::parse_name("DIRECT_MESSAGES"),
            Ok(Intents::DIRECT_MESSAGES)
        );
        assert!(Intents::parse_name("NOT_AN_INTENT").is_err());
    }

    #[test]
    fn test_from_names() {
        let intents = Intents::from_names(["GUILDS", "GUILD_MESSAGES"]).unwrap();
        assert_eq!(intents.as_u64(), 1 | (1 << 9));

        assert!(Intents::from_names(["GUILDS", "BOGUS"]).is_err());
    }

    #[test]
    fn test_serialization_as_number() {
        let intents = Intents::GUILDS | Intents::GUILD_MESSAGES;
        let json = serde_json::to_string(&intents).unwrap();
        assert_eq!(json, "513");

        let parsed: Intents = serde_json::from_str("513").unwrap();
        assert_eq!(parsed, intents);
    }

    #[test]
    fn test_deserialize_ignores_unknown_bits() {
        let parsed: Intents = serde_json::from_str("18446744073709551615").unwrap();
        assert!(parsed.contains(Intents::GUILDS));
        assert!(parsed.contains(Intents::GUILD_SCHEDULED_EVENTS));
    }
}
