//! Client configuration
//!
//! Loads configuration from the environment or builds it in code.

use parley_core::Intents;
use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Default gateway endpoint
const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// Default REST endpoint
const DEFAULT_API_URL: &str = "https://discord.com/api";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Credential kind, controls the Authorization header prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Bot credential ("Bot <token>")
    #[default]
    Bot,
    /// OAuth2 bearer credential ("Bearer <token>")
    Bearer,
    /// Raw token, no prefix
    Raw,
}

impl TokenType {
    /// Format the Authorization header value for a token
    #[must_use]
    pub fn authorization(self, token: &str) -> String {
        match self {
            Self::Bot => format!("Bot {token}"),
            Self::Bearer => format!("Bearer {token}"),
            Self::Raw => token.to_string(),
        }
    }
}

/// Remote API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "6")]
    V6,
    #[serde(rename = "7")]
    V7,
    #[serde(rename = "8")]
    V8,
    #[default]
    #[serde(rename = "9")]
    V9,
}

impl ApiVersion {
    /// The version number as it appears in URLs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V6 => "6",
            Self::V7 => "7",
            Self::V8 => "8",
            Self::V9 => "9",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "6" => Some(Self::V6),
            "7" => Some(Self::V7),
            "8" => Some(Self::V8),
            "9" => Some(Self::V9),
            _ => None,
        }
    }
}

/// Connection properties reported in the Identify payload
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionProperties {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_client_name")]
    pub browser: String,
    #[serde(default = "default_client_name")]
    pub device: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: default_os(),
            browser: default_client_name(),
            device: default_client_name(),
        }
    }
}

/// Reconnect behavior after a dropped connection
///
/// `max_attempts` of `None` retries indefinitely; the counter resets every
/// time a session reaches READY.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Authentication credential, shared by the gateway and the REST client
    pub token: String,

    #[serde(default)]
    pub token_type: TokenType,

    /// Event categories to receive
    #[serde(default)]
    pub intents: Intents,

    #[serde(default)]
    pub api_version: ApiVersion,

    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub properties: ConnectionProperties,

    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: TokenType::default(),
            intents: Intents::empty(),
            api_version: ApiVersion::default(),
            gateway_url: default_gateway_url(),
            api_url: default_api_url(),
            properties: ConnectionProperties::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Set the intents bitmask
    #[must_use]
    pub fn with_intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    /// Set the credential kind
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the remote API version
    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Override the gateway endpoint (used by tests against a local server)
    #[must_use]
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    /// Set the reconnect policy
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// The gateway URL with version and encoding query parameters attached
    #[must_use]
    pub fn gateway_connect_url(&self) -> String {
        format!(
            "{}/?v={}&encoding=json",
            self.gateway_url,
            self.api_version.as_str()
        )
    }

    /// The REST base URL for the configured API version
    #[must_use]
    pub fn rest_base_url(&self) -> String {
        format!("{}/v{}", self.api_url, self.api_version.as_str())
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `PARLEY_TOKEN` is missing or a variable fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let token = env::var("PARLEY_TOKEN").map_err(|_| ConfigError::MissingVar("PARLEY_TOKEN"))?;

        let token_type = match env::var("PARLEY_TOKEN_TYPE").ok().as_deref() {
            None => TokenType::default(),
            Some("bot") | Some("Bot") => TokenType::Bot,
            Some("bearer") | Some("Bearer") => TokenType::Bearer,
            Some("raw") | Some("") => TokenType::Raw,
            Some(other) => {
                return Err(ConfigError::InvalidVar(
                    "PARLEY_TOKEN_TYPE",
                    other.to_string(),
                ))
            }
        };

        let intents = match env::var("PARLEY_INTENTS") {
            Ok(names) => Intents::from_names(names.split(',').map(str::trim))
                .map_err(|e| ConfigError::InvalidVar("PARLEY_INTENTS", e.0))?,
            Err(_) => Intents::empty(),
        };

        let api_version = match env::var("PARLEY_API_VERSION") {
            Ok(v) => ApiVersion::parse(&v).ok_or(ConfigError::InvalidVar("PARLEY_API_VERSION", v))?,
            Err(_) => ApiVersion::default(),
        };

        let reconnect = ReconnectPolicy {
            max_attempts: env::var("PARLEY_RECONNECT_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok()),
            delay_ms: env::var("PARLEY_RECONNECT_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_reconnect_delay_ms),
        };

        Ok(Self {
            token,
            token_type,
            intents,
            api_version,
            gateway_url: env::var("PARLEY_GATEWAY_URL").unwrap_or_else(|_| default_gateway_url()),
            api_url: env::var("PARLEY_API_URL").unwrap_or_else(|_| default_api_url()),
            properties: ConnectionProperties::default(),
            reconnect,
        })
    }
}

// Default value functions
fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_os() -> String {
    env::consts::OS.to_string()
}

fn default_client_name() -> String {
    "parley".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}
