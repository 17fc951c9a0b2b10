//! Canned-response tool adapters.
//!
//! A [`FixtureToolAdapter`] answers from a table keyed by entity code and
//! falls back to a default response. Demo scenarios describe fixtures in
//! JSON:
//!
//! ```json
//! {
//!   "tool": "verified_price",
//!   "responses": {
//!     "600519.SH": { "payload": { "data": [{ "close": 1710.5 }] } },
//!     "000000.SZ": { "error": { "kind": "unknown_entity", "message": "000000.SZ" } }
//!   },
//!   "default": { "payload": { "data": [] } }
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tribunal_domain::tool::params::entity_code;
use tribunal_domain::{AdapterError, Params, ToolAdapter, ToolDefinition};

/// Error kinds a fixture can report, mirroring [`AdapterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureErrorKind {
    NotFound,
    UnknownEntity,
    Unauthorized,
    Forbidden,
    RateLimited,
    Unavailable,
    InvalidRequest,
    Failed,
}

/// One canned answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureResponse {
    Payload(Value),
    Error {
        kind: FixtureErrorKind,
        #[serde(default)]
        message: String,
    },
}

impl FixtureResponse {
    fn to_result(&self) -> Result<Value, AdapterError> {
        let (kind, message) = match self {
            FixtureResponse::Payload(value) => return Ok(value.clone()),
            FixtureResponse::Error { kind, message } => (*kind, message.clone()),
        };
        Err(match kind {
            FixtureErrorKind::NotFound => AdapterError::NotFound(message),
            FixtureErrorKind::UnknownEntity => AdapterError::UnknownEntity(message),
            FixtureErrorKind::Unauthorized => AdapterError::Unauthorized(message),
            FixtureErrorKind::Forbidden => AdapterError::Forbidden(message),
            FixtureErrorKind::RateLimited => AdapterError::RateLimited(message),
            FixtureErrorKind::Unavailable => AdapterError::Unavailable(message),
            FixtureErrorKind::InvalidRequest => AdapterError::InvalidRequest(message),
            FixtureErrorKind::Failed => AdapterError::Failed(message),
        })
    }
}

/// JSON form of a fixture. `definition` overrides the catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSpec {
    pub tool: String,
    #[serde(default)]
    pub definition: Option<ToolDefinition>,
    #[serde(default)]
    pub responses: HashMap<String, FixtureResponse>,
    #[serde(default)]
    pub default: Option<FixtureResponse>,
}

pub struct FixtureToolAdapter {
    definition: ToolDefinition,
    responses: HashMap<String, FixtureResponse>,
    default: Option<FixtureResponse>,
    invocations: AtomicUsize,
}

impl FixtureToolAdapter {
    pub fn new(definition: ToolDefinition) -> Self {
        Self {
            definition,
            responses: HashMap::new(),
            default: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Build from a JSON spec, taking the definition from the spec or from
    /// `fallback` when the spec carries none.
    pub fn from_spec(
        spec: FixtureSpec,
        fallback: impl FnOnce(&str) -> Option<ToolDefinition>,
    ) -> Result<Self, String> {
        let definition = match spec.definition {
            Some(definition) => definition,
            None => fallback(&spec.tool)
                .ok_or_else(|| format!("no definition for fixture tool '{}'", spec.tool))?,
        };
        Ok(Self {
            definition,
            responses: spec.responses,
            default: spec.default,
            invocations: AtomicUsize::new(0),
        })
    }

    // ==================== Builder Methods ====================

    pub fn with_payload(mut self, entity: impl Into<String>, payload: Value) -> Self {
        self.responses
            .insert(entity.into(), FixtureResponse::Payload(payload));
        self
    }

    pub fn with_error(
        mut self,
        entity: impl Into<String>,
        kind: FixtureErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.responses.insert(
            entity.into(),
            FixtureResponse::Error {
                kind,
                message: message.into(),
            },
        );
        self
    }

    pub fn with_default(mut self, response: FixtureResponse) -> Self {
        self.default = Some(response);
        self
    }

    /// How many times the adapter was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolAdapter for FixtureToolAdapter {
    fn describe(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, params: &Params) -> Result<Value, AdapterError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let entity = entity_code(params);
        let response = entity
            .as_deref()
            .and_then(|e| self.responses.get(e))
            .or(self.default.as_ref());
        match response {
            Some(response) => response.to_result(),
            None => Err(AdapterError::NotFound(format!(
                "{} has no data for {}",
                self.definition.name,
                entity.as_deref().unwrap_or("this request")
            ))),
        }
    }
}
