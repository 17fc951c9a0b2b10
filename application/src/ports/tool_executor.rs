//! Tool Executor port
//!
//! The debate loop reaches tools only through this port. The gateway is the
//! production implementation.

use async_trait::async_trait;
use tribunal_domain::{ToolCall, ToolDefinition, ToolError, ToolResult, ToolSpec};

/// A call after alias resolution, normalization, guardrails and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    /// Canonical tool name and normalized arguments
    pub call: ToolCall,
    /// Content-derived key of (tool, normalized params)
    pub cache_key: String,
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Get the specification of all available tools
    fn tool_spec(&self) -> &ToolSpec;

    /// Check if a tool is available (canonical name or alias)
    fn has_tool(&self, name: &str) -> bool {
        self.tool_spec().resolve(name).is_some()
    }

    /// Get the definition of a specific tool
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get_resolved(name)
    }

    /// Get names of all available tools
    fn available_tools(&self) -> Vec<&str> {
        self.tool_spec().names().collect()
    }

    /// Resolve, normalize and validate without invoking anything.
    fn prepare(&self, call: &ToolCall) -> Result<PreparedCall, ToolError>;

    /// Execute a tool call. Failures are returned as failed results.
    async fn execute(&self, call: &ToolCall) -> ToolResult;
}
