//! Tool Registry
//!
//! The [`ToolRegistry`] is an explicit name → adapter map built at startup
//! and handed to the gateway. Each adapter describes itself once; the
//! registry merges the definitions into a [`ToolSpec`] and keeps alias
//! mappings for names models tend to invent.
//!
//! # Usage
//!
//! ```ignore
//! let registry = ToolRegistry::new()
//!     .register(Arc::new(price_adapter))
//!     .register(Arc::new(news_adapter))
//!     .with_alias("stock_price", "verified_price");
//!
//! assert!(registry.adapter("stock_price").is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tribunal_domain::{ToolAdapter, ToolDefinition, ToolSpec};

/// Explicit registration map from tool name to adapter.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    adapters: HashMap<String, Arc<dyn ToolAdapter>>,
    tool_spec: ToolSpec,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the name it describes.
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        let definition = adapter.describe();
        if self.adapters.contains_key(&definition.name) {
            tracing::warn!(tool = %definition.name, "Tool registered twice, replacing previous adapter");
        } else {
            tracing::debug!(tool = %definition.name, version = %definition.version, "Registered tool");
        }
        self.adapters.insert(definition.name.clone(), adapter);
        self.tool_spec = self.tool_spec.register(definition);
        self
    }

    /// Register a tool-name alias.
    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.tool_spec = self.tool_spec.register_alias(alias, canonical);
        self
    }

    pub fn with_aliases(
        mut self,
        mappings: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.tool_spec = self.tool_spec.register_aliases(mappings);
        self
    }

    pub fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    /// Adapter and definition for a canonical name or alias.
    pub fn resolve(&self, name: &str) -> Option<(&ToolDefinition, &Arc<dyn ToolAdapter>)> {
        let definition = self.tool_spec.get_resolved(name)?;
        let adapter = self.adapters.get(&definition.name)?;
        Some((definition, adapter))
    }

    pub fn adapter(&self, name: &str) -> Option<&Arc<dyn ToolAdapter>> {
        self.resolve(name).map(|(_, adapter)| adapter)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.adapters.keys().map(|s| s.as_str()).collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
