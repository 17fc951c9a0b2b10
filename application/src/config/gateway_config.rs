//! Tool Gateway configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tribunal_domain::GuardrailPolicies;

/// Call budget for one tool within a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max_calls: u32,
    pub window_secs: u64,
}

impl RateLimit {
    pub fn new(max_calls: u32, window_secs: u64) -> Self {
        Self {
            max_calls,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(30, 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Budget for tools without an entry in `rate_limits`
    pub default_rate_limit: RateLimit,
    /// Per-tool budgets
    pub rate_limits: HashMap<String, RateLimit>,
    /// Calls slower than this are flagged `slow`
    pub slow_call_ms: u64,
    /// Cache Recoverable/Terminal failures briefly to avoid hammering
    pub cache_errors: bool,
    pub error_cache_ttl_secs: u64,
    /// Per-tool TTL overrides in seconds
    pub ttl_overrides_secs: HashMap<String, u64>,
    /// Provider policies keyed by tool family
    pub guardrails: GuardrailPolicies,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_rate_limit: RateLimit::default(),
            rate_limits: HashMap::new(),
            slow_call_ms: 3_000,
            cache_errors: false,
            error_cache_ttl_secs: 30,
            ttl_overrides_secs: HashMap::new(),
            guardrails: GuardrailPolicies::default(),
        }
    }
}

impl GatewayConfig {
    pub fn rate_limit_for(&self, tool: &str) -> RateLimit {
        self.rate_limits
            .get(tool)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    pub fn slow_call_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_call_ms)
    }

    pub fn error_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.error_cache_ttl_secs)
    }

    pub fn ttl_overrides(&self) -> impl Iterator<Item = (String, Duration)> + '_ {
        self.ttl_overrides_secs
            .iter()
            .map(|(tool, secs)| (tool.clone(), Duration::from_secs(*secs)))
    }

    // ==================== Builder Methods ====================

    pub fn with_rate_limit(mut self, tool: impl Into<String>, limit: RateLimit) -> Self {
        self.rate_limits.insert(tool.into(), limit);
        self
    }

    pub fn with_default_rate_limit(mut self, limit: RateLimit) -> Self {
        self.default_rate_limit = limit;
        self
    }

    pub fn with_slow_call_ms(mut self, ms: u64) -> Self {
        self.slow_call_ms = ms;
        self
    }

    pub fn with_error_caching(mut self, ttl_secs: u64) -> Self {
        self.cache_errors = true;
        self.error_cache_ttl_secs = ttl_secs;
        self
    }

    pub fn with_ttl_override(mut self, tool: impl Into<String>, secs: u64) -> Self {
        self.ttl_overrides_secs.insert(tool.into(), secs);
        self
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailPolicies) -> Self {
        self.guardrails = guardrails;
        self
    }
}
