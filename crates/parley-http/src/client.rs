//! Generic authenticated REST client

use crate::error::{RestError, RestResult};
use parley_common::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// User-Agent reported on every request
const LIB_USER_AGENT: &str = "Parley (https://github.com/seung/parley, 0.1.0)";

/// Generic authenticated request/response capability.
///
/// Given a method, path, optional query and optional JSON body, performs the
/// request with the configured credential and returns parsed JSON. The same
/// credential is embedded in the gateway Identify frame.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Build a REST client from the shared configuration
    pub fn new(config: &ClientConfig) -> RestResult<Self> {
        let mut headers = HeaderMap::new();

        let authorization = config.token_type.authorization(&config.token);
        let mut auth_value = HeaderValue::from_str(&authorization)
            .map_err(|e| RestError::Decode(format!("invalid credential header: {e}")))?;
        auth_value.set_sensitive(true);

        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(LIB_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.rest_base_url(),
        })
    }

    /// Perform an authenticated request against the REST API.
    ///
    /// `path` is appended to the versioned base URL and should start with `/`.
    /// A `204 No Content` response yields `Value::Null`.
    pub async fn request<Q>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&Value>,
    ) -> RestResult<Value>
    where
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(method = %method, path = %path, "REST request");

        let mut request = self.http.request(method, &url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(RestError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("retry_after").and_then(Value::as_f64));
            return Err(RestError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
                .unwrap_or_else(|| status.to_string());

            tracing::warn!(status = status.as_u16(), message = %message, "REST request failed");

            return Err(RestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| RestError::Decode(e.to_string()))
    }

    /// The versioned base URL requests are issued against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
