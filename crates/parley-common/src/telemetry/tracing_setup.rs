//! Tracing subscriber setup
//!
//! The library only emits `tracing` events and never installs a subscriber
//! on its own; an application that already has one keeps full control. These
//! helpers exist for binaries, examples, and tests that want a sensible
//! default without wiring up tracing-subscriber themselves.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for the bundled subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event, for log pipelines
    Json,
}

/// Errors from installing the subscriber
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber was installed before this call
    #[error("a global tracing subscriber is already installed")]
    SubscriberInstalled,
}

/// Install a global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_filter` (e.g. `"info"` or `"parley_gateway=debug,warn"`).
pub fn init(default_filter: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
    };

    installed.map_err(|_| TelemetryError::SubscriberInstalled)
}
