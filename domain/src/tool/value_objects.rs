//! Tool domain value objects: results and the three-tier error taxonomy
//!
//! Every gateway call produces a [`ToolResult`]. Failures carry a
//! [`ToolError`] whose [`ErrorTier`] tells the caller what to do next:
//!
//! | Tier | Meaning | Caller policy |
//! |------|---------|---------------|
//! | `Recoverable` | transient or parameter-fixable | retry with adjusted params or fall back to another tool |
//! | `Terminal` | this query has no answer | do not retry the same query |
//! | `Fatal` | systemic (auth, access) | abandon the tool family for the session |

use serde::{Deserialize, Serialize};

use super::entities::Params;

/// Severity class of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTier {
    Recoverable,
    Terminal,
    Fatal,
}

impl ErrorTier {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorTier::Recoverable => "recoverable",
            ErrorTier::Terminal => "terminal",
            ErrorTier::Fatal => "fatal",
        }
    }

    /// Whether retrying (possibly with different parameters) can help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorTier::Recoverable)
    }
}

impl std::fmt::Display for ErrorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error that occurred during a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub tier: ErrorTier,
    /// Error code (e.g., "RATE_LIMITED", "NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(tier: ErrorTier, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tier,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Recoverable

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorTier::Recoverable, "INVALID_ARGUMENT", message)
    }

    pub fn rate_limited(tool: &str, max_calls: u32, window_secs: u64) -> Self {
        Self::new(
            ErrorTier::Recoverable,
            "RATE_LIMITED",
            format!(
                "Rate limit for '{}' exceeded ({} calls per {}s); try again later or use another tool",
                tool, max_calls, window_secs
            ),
        )
    }

    pub fn range_too_wide(span_days: i64, max_days: i64) -> Self {
        Self::new(
            ErrorTier::Recoverable,
            "RANGE_TOO_WIDE",
            format!(
                "Requested date range spans {} days but the provider allows at most {}; narrow the range and retry",
                span_days, max_days
            ),
        )
    }

    pub fn future_start_date(start: &str) -> Self {
        Self::new(
            ErrorTier::Recoverable,
            "FUTURE_START_DATE",
            format!("Start date {} lies in the future; no data can exist yet", start),
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorTier::Recoverable, "UNAVAILABLE", message)
    }

    // Terminal

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorTier::Terminal,
            "NOT_FOUND",
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self::new(
            ErrorTier::Terminal,
            "UNKNOWN_ENTITY",
            format!("Entity not known to this provider: {}", entity.into()),
        )
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::new(
            ErrorTier::Terminal,
            "UNKNOWN_TOOL",
            format!("Tool not registered: {}", name.into()),
        )
    }

    // Fatal

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorTier::Fatal, "UNAUTHORIZED", message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorTier::Fatal, "PERMISSION_DENIED", message)
    }

    pub fn family_disabled(family: &str) -> Self {
        Self::new(
            ErrorTier::Fatal,
            "FAMILY_DISABLED",
            format!(
                "Tool family '{}' is disabled for this session after a fatal error",
                family
            ),
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.tier == ErrorTier::Fatal
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.tier, self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Structured metadata about a gateway call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    /// Adapter latency in milliseconds (absent on cache hits)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Served from the gateway cache
    #[serde(default)]
    pub cached: bool,
    /// Latency exceeded the slow-call threshold
    #[serde(default)]
    pub slow: bool,
    /// The canonical data array was present but empty
    #[serde(default)]
    pub empty: bool,
    /// Content-derived cache key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// Parameters after alias resolution, guardrails and defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_params: Option<Params>,
    /// Non-fatal annotations (capped dates, dropped parameters, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of a tool call, carrying the payload or the classified error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Canonical name of the tool that was called
    pub tool_name: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Structured payload (for successful calls)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Error information (for failed calls)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            payload: Some(payload),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            payload: None,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ToolResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.metadata.warnings.push(warning.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Succeeded, but the canonical data array was empty.
    pub fn is_empty_result(&self) -> bool {
        self.success && self.metadata.empty
    }
}
