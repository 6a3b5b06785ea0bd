//! # parley-http
//!
//! The authenticated HTTP collaborator: a single generic request capability
//! against the platform REST API. Resource-specific helpers are deliberately
//! not provided; consumers build paths and bodies themselves.

mod client;
mod error;

pub use client::RestClient;
pub use error::{RestError, RestResult};

// Re-export so consumers don't need a direct reqwest dependency for methods
pub use reqwest::Method;
