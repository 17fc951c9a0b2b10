//! Tool adapter contract
//!
//! External data providers are opaque behind [`ToolAdapter`]: an adapter
//! describes itself once and is invoked with already-normalized
//! parameters. Adapters report failures through [`AdapterError`]; the
//! gateway maps those onto the three-tier [`ToolError`] taxonomy so every
//! adapter is classified the same way.
//!
//! ```text
//! ToolGateway ──▶ ToolAdapter::invoke(params)
//!                    │
//!                    ├─ Ok(payload) ──▶ classify_payload()  (provider error flags)
//!                    └─ Err(e)      ──▶ ToolError::from(e)
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::entities::{Params, ToolDefinition};
use super::value_objects::{ErrorTier, ToolError};

/// Failure reported by an adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider does not know this entity
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Credentials missing or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials valid but access denied
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Provider-side throttling
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Timeouts, connection resets, 5xx
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request shape
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else
    #[error("Failed: {0}")]
    Failed(String),
}

impl From<AdapterError> for ToolError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(m) => ToolError::not_found(m),
            AdapterError::UnknownEntity(m) => ToolError::unknown_entity(m),
            AdapterError::Unauthorized(m) => ToolError::unauthorized(m),
            AdapterError::Forbidden(m) => ToolError::permission_denied(m),
            AdapterError::RateLimited(m) => {
                ToolError::new(ErrorTier::Recoverable, "PROVIDER_RATE_LIMITED", m)
            }
            AdapterError::Unavailable(m) => ToolError::unavailable(m),
            AdapterError::InvalidRequest(m) => ToolError::invalid_argument(m),
            AdapterError::Failed(m) => classify_message(&m),
        }
    }
}

/// A pluggable data provider.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Name, version and parameter schema of this tool.
    fn describe(&self) -> ToolDefinition;

    /// Run the tool with normalized, validated parameters.
    async fn invoke(&self, params: &Params) -> Result<serde_json::Value, AdapterError>;
}

/// Classify a free-form provider error message by keyword.
///
/// Used for adapters that only report strings (and for error flags
/// embedded in otherwise successful payloads).
pub fn classify_message(message: &str) -> ToolError {
    let lower = message.to_ascii_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if any(&["unauthorized", "invalid token", "invalid api key", "401", "authentication"]) {
        ToolError::unauthorized(message)
    } else if any(&["forbidden", "permission", "access denied", "403", "no access"]) {
        ToolError::permission_denied(message)
    } else if any(&["not found", "404", "no such", "does not exist"]) {
        ToolError::not_found(message)
    } else if any(&["unknown symbol", "unknown entity", "invalid symbol", "unknown ticker"]) {
        ToolError::unknown_entity(message)
    } else if any(&["rate limit", "too many requests", "429", "quota"]) {
        ToolError::new(ErrorTier::Recoverable, "PROVIDER_RATE_LIMITED", message)
    } else {
        ToolError::unavailable(message)
    }
}

/// Detect an explicit provider error inside a successful payload.
///
/// Providers commonly answer HTTP 200 with `{"error": "..."}`,
/// `{"is_error": true, ...}` or `{"status": "error", "message": "..."}`.
/// Such payloads must never be treated (or cached) as success.
pub fn provider_error(payload: &serde_json::Value) -> Option<String> {
    let obj = payload.as_object()?;

    if let Some(err) = obj.get("error")
        && !err.is_null()
        && err != &serde_json::Value::Bool(false)
    {
        return Some(match err {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }

    let message = || {
        obj.get("message")
            .or_else(|| obj.get("msg"))
            .and_then(|m| m.as_str())
            .unwrap_or("provider reported an error")
            .to_string()
    };

    if obj.get("is_error").and_then(|v| v.as_bool()) == Some(true) {
        return Some(message());
    }
    if let Some(status) = obj.get("status").and_then(|v| v.as_str())
        && status.eq_ignore_ascii_case("error")
    {
        return Some(message());
    }
    None
}

/// Classify a successful adapter payload: `Some(error)` when the provider
/// embedded an error flag.
pub fn classify_payload(payload: &serde_json::Value) -> Option<ToolError> {
    provider_error(payload).map(|m| classify_message(&m))
}
