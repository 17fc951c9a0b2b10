//! HTTP JSON tool adapter (feature `http-tools`).
//!
//! POSTs the normalized parameters as a JSON body and returns the decoded
//! response. HTTP status codes are mapped onto [`AdapterError`] so the
//! gateway classifies remote failures like any other adapter's:
//!
//! | Status | Error |
//! |--------|-------|
//! | 400, 422 | `InvalidRequest` |
//! | 401 | `Unauthorized` |
//! | 403 | `Forbidden` |
//! | 404 | `NotFound` |
//! | 429 | `RateLimited` |
//! | 5xx, timeouts, connect errors | `Unavailable` |

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use tribunal_domain::{AdapterError, Params, ToolAdapter, ToolDefinition};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Error bodies are truncated to this many characters in messages
const MAX_ERROR_BODY: usize = 200;

pub struct HttpJsonToolAdapter {
    definition: ToolDefinition,
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpJsonToolAdapter {
    pub fn new(
        definition: ToolDefinition,
        endpoint: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(definition, endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        definition: ToolDefinition,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tribunal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            definition,
            client,
            endpoint: endpoint.into(),
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Map a non-success status onto the adapter error contract.
pub fn status_error(status: u16, body: &str) -> AdapterError {
    let detail: String = body.chars().take(MAX_ERROR_BODY).collect();
    let message = format!("HTTP {}: {}", status, detail);
    match status {
        400 | 422 => AdapterError::InvalidRequest(message),
        401 => AdapterError::Unauthorized(message),
        403 => AdapterError::Forbidden(message),
        404 => AdapterError::NotFound(message),
        429 => AdapterError::RateLimited(message),
        500..=599 => AdapterError::Unavailable(message),
        _ => AdapterError::Failed(message),
    }
}

fn transport_error(error: reqwest::Error) -> AdapterError {
    if error.is_timeout() || error.is_connect() {
        AdapterError::Unavailable(error.to_string())
    } else {
        AdapterError::Failed(error.to_string())
    }
}

#[async_trait]
impl ToolAdapter for HttpJsonToolAdapter {
    fn describe(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, params: &Params) -> Result<Value, AdapterError> {
        let mut request = self.client.post(&self.endpoint).json(params);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(tool = %self.definition.name, status = status.as_u16(), "HTTP tool response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AdapterError::Failed(format!("invalid JSON body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(400, ""), AdapterError::InvalidRequest(_)));
        assert!(matches!(status_error(422, ""), AdapterError::InvalidRequest(_)));
        assert!(matches!(status_error(401, ""), AdapterError::Unauthorized(_)));
        assert!(matches!(status_error(403, ""), AdapterError::Forbidden(_)));
        assert!(matches!(status_error(404, ""), AdapterError::NotFound(_)));
        assert!(matches!(status_error(429, ""), AdapterError::RateLimited(_)));
        assert!(matches!(status_error(503, ""), AdapterError::Unavailable(_)));
        assert!(matches!(status_error(418, ""), AdapterError::Failed(_)));
    }

    #[test]
    fn test_error_body_truncated() {
        let body = "x".repeat(1000);
        let AdapterError::Unavailable(message) = status_error(502, &body) else {
            panic!("expected Unavailable");
        };
        assert!(message.len() < 300);
        assert!(message.starts_with("HTTP 502"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let adapter = HttpJsonToolAdapter::with_timeout(
            ToolDefinition::new("remote_price", "Remote price feed"),
            "http://127.0.0.1:9/price",
            Duration::from_millis(500),
        )
        .unwrap();
        assert!(matches!(
            adapter.invoke(&Params::new()).await,
            Err(AdapterError::Unavailable(_))
        ));
    }
}
