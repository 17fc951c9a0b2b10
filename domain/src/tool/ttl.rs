//! Tool-specific TTLs.
//!
//! A tool's TTL comes from an explicit per-tool override when configured,
//! otherwise from its [`LifecycleClass`]. The same TTL governs gateway
//! cache entries, evidence expiry and working-memory items.

use std::collections::HashMap;
use std::time::Duration;

use super::entities::{LifecycleClass, ToolSpec};

#[derive(Debug, Clone, Default)]
pub struct TtlPolicy {
    lifecycles: HashMap<String, LifecycleClass>,
    overrides: HashMap<String, Duration>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle classes for every registered tool.
    pub fn from_spec(spec: &ToolSpec) -> Self {
        Self {
            lifecycles: spec
                .all()
                .map(|def| (def.name.clone(), def.lifecycle))
                .collect(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, tool: impl Into<String>, ttl: Duration) -> Self {
        self.overrides.insert(tool.into(), ttl);
        self
    }

    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = (String, Duration)>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Lifecycle class of a tool; unknown tools count as daily data.
    pub fn lifecycle(&self, tool: &str) -> LifecycleClass {
        self.lifecycles.get(tool).copied().unwrap_or_default()
    }

    pub fn ttl_for(&self, tool: &str) -> Duration {
        self.overrides
            .get(tool)
            .copied()
            .unwrap_or_else(|| self.lifecycle(tool).default_ttl())
    }

    pub fn is_volatile(&self, tool: &str) -> bool {
        self.lifecycle(tool).is_volatile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolDefinition;

    #[test]
    fn test_ttl_from_lifecycle_and_override() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("quote", "Quote").with_lifecycle(LifecycleClass::Realtime))
            .register(ToolDefinition::new("profile", "Profile").with_lifecycle(LifecycleClass::Static));
        let policy = TtlPolicy::from_spec(&spec).with_override("profile", Duration::from_secs(60));

        assert_eq!(policy.ttl_for("quote"), Duration::from_secs(300));
        assert_eq!(policy.ttl_for("profile"), Duration::from_secs(60));
        assert_eq!(policy.ttl_for("unknown"), LifecycleClass::Daily.default_ttl());
        assert!(policy.is_volatile("quote"));
        assert!(!policy.is_volatile("profile"));
    }
}
