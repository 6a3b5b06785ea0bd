//! REST error types

use thiserror::Error;

/// REST request errors
#[derive(Debug, Error)]
pub enum RestError {
    /// Credential rejected by the remote end
    #[error("Unauthorized: credential rejected")]
    Unauthorized,

    /// Request was rate limited; the caller decides whether to retry
    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<f64> },

    /// Remote returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("Decode error: {0}")]
    Decode(String),
}

/// REST result type
pub type RestResult<T> = Result<T, RestError>;
