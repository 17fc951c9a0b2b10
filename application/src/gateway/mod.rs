//! Tool Gateway
//!
//! The single door between the debate and external data providers. Every
//! call goes through the same pipeline:
//!
//! ```text
//! ToolCall
//!   │ resolve alias ─▶ normalize params ─▶ provider guardrails ─▶ validate
//!   │                                                              │
//!   │                              family disabled? ◀──────────────┘
//!   ▼
//! cache lookup (gw:{hash}) ── hit ──▶ ToolResult (cached)
//!   │ miss
//!   ▼
//! rate limiter ─▶ ToolAdapter::invoke ─▶ classify ─▶ cache write ─▶ ToolResult
//! ```
//!
//! Failures never surface as Rust errors: they are [`ToolResult`] failures
//! carrying a tiered [`ToolError`]. A Fatal error disables the tool's whole
//! family for the lifetime of the gateway.

pub mod rate_limiter;
pub mod registry;
pub mod stats;

pub use rate_limiter::RateLimiter;
pub use registry::ToolRegistry;
pub use stats::{GatewayStats, GatewayStatsSnapshot};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tribunal_domain::evidence::sanity::is_empty_result;
use tribunal_domain::{
    DefaultToolValidator, ToolCall, ToolError, ToolResult, ToolResultMetadata, ToolSpec,
    ToolValidator, TtlPolicy, classify_payload, inputs_hash, normalize_params,
};

use crate::config::GatewayConfig;
use crate::ports::clock::Clock;
use crate::ports::fast_cache::FastCache;
use crate::ports::tool_executor::{PreparedCall, ToolExecutorPort};

/// What the gateway keeps under `gw:{hash}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CachedOutcome {
    Success { payload: serde_json::Value },
    Failure { error: ToolError },
}

fn cache_key(inputs_hash: &str) -> String {
    format!("gw:{}", inputs_hash)
}

pub struct ToolGateway {
    registry: ToolRegistry,
    cache: Arc<dyn FastCache>,
    clock: Arc<dyn Clock>,
    rate_limiter: RateLimiter,
    ttl_policy: TtlPolicy,
    config: GatewayConfig,
    disabled_families: Mutex<HashSet<String>>,
    stats: GatewayStats,
}

impl ToolGateway {
    pub fn new(
        registry: ToolRegistry,
        cache: Arc<dyn FastCache>,
        clock: Arc<dyn Clock>,
        config: GatewayConfig,
    ) -> Self {
        let ttl_policy =
            TtlPolicy::from_spec(registry.tool_spec()).with_overrides(config.ttl_overrides());
        let rate_limiter = RateLimiter::new(cache.clone(), clock.clone(), &config);
        Self {
            registry,
            cache,
            clock,
            rate_limiter,
            ttl_policy,
            config,
            disabled_families: Mutex::new(HashSet::new()),
            stats: GatewayStats::default(),
        }
    }

    /// TTLs per tool; shared with the evidence lifecycle and working memory.
    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl_policy
    }

    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_family_disabled(&self, family: &str) -> bool {
        self.disabled_families
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(family)
    }

    fn disable_family(&self, family: &str) {
        self.disabled_families
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(family.to_string());
    }

    fn fail(&self, tool: &str, error: ToolError, metadata: ToolResultMetadata) -> ToolResult {
        self.stats.record_failure(error.tier);
        ToolResult::failure(tool, error).with_metadata(metadata)
    }

    async fn lookup(&self, key: &str) -> Option<CachedOutcome> {
        match self.cache.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::debug!(key, error = %e, "Discarding unreadable gateway cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Gateway cache read failed, calling adapter");
                None
            }
        }
    }

    async fn remember(&self, key: &str, outcome: &CachedOutcome, ttl: Duration) {
        let value = match serde_json::to_value(outcome) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not serialize gateway cache entry");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, value, Some(ttl)).await {
            tracing::warn!(key, error = %e, "Gateway cache write failed");
        }
    }
}

#[async_trait]
impl ToolExecutorPort for ToolGateway {
    fn tool_spec(&self) -> &ToolSpec {
        self.registry.tool_spec()
    }

    fn prepare(&self, call: &ToolCall) -> Result<PreparedCall, ToolError> {
        let definition = self
            .registry
            .tool_spec()
            .get_resolved(&call.tool_name)
            .ok_or_else(|| ToolError::unknown_tool(&call.tool_name))?;

        let normalized = normalize_params(definition, &call.arguments);
        let mut warnings: Vec<String> = normalized
            .dropped
            .iter()
            .map(|name| format!("Dropped parameter '{}' not accepted by {}", name, definition.name))
            .collect();

        let outcome = self.config.guardrails.apply(
            definition.family_or_name(),
            normalized.params,
            self.clock.today(),
        )?;
        warnings.extend(outcome.warnings);

        DefaultToolValidator
            .validate(&outcome.params, definition)
            .map_err(ToolError::invalid_argument)?;

        let cache_key = inputs_hash(&definition.name, &outcome.params);
        Ok(PreparedCall {
            call: ToolCall {
                tool_name: definition.name.clone(),
                arguments: outcome.params,
                reasoning: call.reasoning.clone(),
            },
            cache_key,
            warnings,
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        self.stats.record_call();

        let Some((definition, adapter)) = self.registry.resolve(&call.tool_name) else {
            return self.fail(
                &call.tool_name,
                ToolError::unknown_tool(&call.tool_name),
                ToolResultMetadata::default(),
            );
        };
        let tool = definition.name.clone();
        let family = definition.family_or_name().to_string();

        if self.is_family_disabled(&family) {
            tracing::debug!(tool = %tool, family = %family, "Tool family disabled, failing fast");
            return self.fail(&tool, ToolError::family_disabled(&family), ToolResultMetadata::default());
        }

        let prepared = match self.prepare(call) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(tool = %tool, code = %e.code, "Tool call rejected before invocation");
                return self.fail(&tool, e, ToolResultMetadata::default());
            }
        };

        let mut metadata = ToolResultMetadata {
            cache_key: Some(prepared.cache_key.clone()),
            normalized_params: Some(prepared.call.arguments.clone()),
            warnings: prepared.warnings.clone(),
            ..Default::default()
        };
        let key = cache_key(&prepared.cache_key);

        if let Some(outcome) = self.lookup(&key).await {
            self.stats.record_cache_hit();
            metadata.cached = true;
            tracing::debug!(tool = %tool, cache_key = %prepared.cache_key, "Gateway cache hit");
            return match outcome {
                CachedOutcome::Success { payload } => {
                    ToolResult::success(&tool, payload).with_metadata(metadata)
                }
                CachedOutcome::Failure { error } => self.fail(&tool, error, metadata),
            };
        }

        match self.rate_limiter.acquire(&tool).await {
            Ok(Ok(())) => {}
            Ok(Err(limited)) => {
                self.stats.record_rate_limited();
                return self.fail(&tool, limited, metadata);
            }
            Err(e) => {
                tracing::warn!(tool = %tool, error = %e, "Rate limiter unavailable, allowing call");
            }
        }

        self.stats.record_adapter_call();
        let started = Instant::now();
        let invoked = adapter.invoke(&prepared.call.arguments).await;
        let elapsed = started.elapsed();

        let duration_ms = duration_ms(elapsed);
        metadata.duration_ms = Some(duration_ms);
        if elapsed >= self.config.slow_call_threshold() {
            metadata.slow = true;
            self.stats.record_slow();
            tracing::warn!(
                tool = %tool,
                duration_ms,
                threshold_ms = self.config.slow_call_ms,
                "Slow tool call"
            );
        }

        let outcome = match invoked {
            Ok(payload) => match classify_payload(&payload) {
                Some(error) => Err(error),
                None => Ok(payload),
            },
            Err(e) => Err(ToolError::from(e)),
        };

        match outcome {
            Ok(payload) => {
                metadata.empty = is_empty_result(&payload);
                if metadata.empty {
                    tracing::debug!(tool = %tool, "Empty result set, not cached");
                } else {
                    let cached = CachedOutcome::Success {
                        payload: payload.clone(),
                    };
                    self.remember(&key, &cached, self.ttl_policy.ttl_for(&tool)).await;
                }
                tracing::debug!(
                    tool = %tool,
                    duration_ms = metadata.duration_ms.unwrap_or_default(),
                    empty = metadata.empty,
                    "Tool call succeeded"
                );
                ToolResult::success(&tool, payload).with_metadata(metadata)
            }
            Err(error) => {
                if error.is_fatal() {
                    self.disable_family(&family);
                    tracing::error!(
                        tool = %tool,
                        family = %family,
                        code = %error.code,
                        message = %error.message,
                        "Fatal tool error, disabling tool family for this session"
                    );
                } else {
                    tracing::warn!(
                        tool = %tool,
                        tier = %error.tier,
                        code = %error.code,
                        "Tool call failed"
                    );
                    if self.config.cache_errors {
                        let cached = CachedOutcome::Failure {
                            error: error.clone(),
                        };
                        self.remember(&key, &cached, self.config.error_cache_ttl()).await;
                    }
                }
                self.fail(&tool, error, metadata)
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimit;
    use crate::ports::clock::ManualClock;
    use crate::testing::{CountingAdapter, MapCache, fixed_now};
    use serde_json::json;
    use tribunal_domain::{
        AdapterError, ErrorTier, GuardrailPolicies, ParamType, ProviderPolicy, ToolDefinition,
        ToolParameter,
    };

    fn price_tool() -> ToolDefinition {
        ToolDefinition::new("verified_price", "Verified closing prices")
            .with_family("exchange")
            .with_parameter(ToolParameter::new("entity_code", "Entity code", true))
            .with_parameter(ToolParameter::new("start_date", "Start", false))
            .with_parameter(ToolParameter::new("end_date", "End", false))
            .with_parameter(
                ToolParameter::new("limit", "Page size", false).with_type(ParamType::Integer),
            )
    }

    fn gateway(adapters: Vec<Arc<CountingAdapter>>, config: GatewayConfig) -> ToolGateway {
        let clock = Arc::new(ManualClock::new(fixed_now()));
        let cache = Arc::new(MapCache::new(clock.clone()));
        let mut registry = ToolRegistry::new();
        for adapter in adapters {
            registry = registry.register(adapter);
        }
        ToolGateway::new(registry.with_alias("stock_price", "verified_price"), cache, clock, config)
    }

    fn call() -> ToolCall {
        ToolCall::new("verified_price").with_arg("entity_code", "600519.SH")
    }

    #[tokio::test]
    async fn test_identical_normalized_calls_hit_cache() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": [{"close": 1710.5}]})));
        let gw = gateway(vec![adapter.clone()], GatewayConfig::default());

        let first = gw.execute(&call()).await;
        assert!(first.is_success());
        assert!(!first.metadata.cached);
        assert!(first.metadata.duration_ms.is_some());

        // alias tool name, alias entity key and a noise field normalize to the same key
        let second = gw
            .execute(
                &ToolCall::new("stock_price")
                    .with_arg("ticker", " 600519.SH ")
                    .with_arg("request_id", "abc"),
            )
            .await;
        assert!(second.is_success());
        assert!(second.metadata.cached);
        assert_eq!(second.payload, first.payload);
        assert_eq!(second.metadata.cache_key, first.metadata.cache_key);
        assert_eq!(adapter.calls(), 1);
        assert_eq!(gw.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_success_but_never_cached() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": []})));
        let gw = gateway(vec![adapter.clone()], GatewayConfig::default());

        let result = gw.execute(&call()).await;
        assert!(result.is_success());
        assert!(result.is_empty_result());

        gw.execute(&call()).await;
        assert_eq!(adapter.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_payload_is_failure() {
        let adapter = Arc::new(CountingAdapter::new(
            price_tool(),
            json!({"status": "error", "message": "symbol not found"}),
        ));
        let gw = gateway(vec![adapter.clone()], GatewayConfig::default());

        let result = gw.execute(&call()).await;
        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().tier, ErrorTier::Terminal);

        gw.execute(&call()).await;
        assert_eq!(adapter.calls(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_disables_family() {
        let price = Arc::new(CountingAdapter::failing(
            price_tool(),
            AdapterError::Unauthorized("bad key".into()),
        ));
        let volume = Arc::new(CountingAdapter::new(
            ToolDefinition::new("exchange_daily", "Daily bars")
                .with_family("exchange")
                .with_parameter(ToolParameter::new("entity_code", "Entity code", true)),
            json!({"data": [1]}),
        ));
        let gw = gateway(vec![price.clone(), volume.clone()], GatewayConfig::default());

        let first = gw.execute(&call()).await;
        assert_eq!(first.error().unwrap().code, "UNAUTHORIZED");
        assert!(gw.is_family_disabled("exchange"));

        let second = gw
            .execute(&ToolCall::new("exchange_daily").with_arg("entity_code", "600519.SH"))
            .await;
        let err = second.error().unwrap();
        assert_eq!(err.code, "FAMILY_DISABLED");
        assert!(err.is_fatal());
        assert_eq!(volume.calls(), 0);
        assert_eq!(gw.stats().fatal_failures, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_without_adapter_call() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": [1]})));
        let config = GatewayConfig::default().with_rate_limit("verified_price", RateLimit::new(1, 60));
        let gw = gateway(vec![adapter.clone()], config);

        assert!(gw.execute(&call()).await.is_success());
        let limited = gw
            .execute(&ToolCall::new("verified_price").with_arg("entity_code", "000858.SZ"))
            .await;
        assert_eq!(limited.error().unwrap().code, "RATE_LIMITED");
        assert!(limited.error().unwrap().tier.is_retryable());
        assert_eq!(adapter.calls(), 1);

        // cache hits do not consume budget
        assert!(gw.execute(&call()).await.metadata.cached);
        assert_eq!(gw.stats().rate_limited, 1);
    }

    #[tokio::test]
    async fn test_guardrails_cap_end_date_and_reject_future_start() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": [1]})));
        let config = GatewayConfig::default().with_guardrails(
            GuardrailPolicies::new()
                .with_policy("exchange", ProviderPolicy::default().with_max_span_days(366)),
        );
        let gw = gateway(vec![adapter.clone()], config);
        let today = fixed_now().date_naive().format("%Y-%m-%d").to_string();

        let capped = gw
            .execute(&call().with_arg("start_date", "2026-01-05").with_arg("end_date", "2099-01-01"))
            .await;
        assert!(capped.is_success());
        let params = capped.metadata.normalized_params.as_ref().unwrap();
        assert_eq!(params["end_date"], json!(today));
        assert!(!capped.metadata.warnings.is_empty());

        let rejected = gw.execute(&call().with_arg("start_date", "2099-01-01")).await;
        assert_eq!(rejected.error().unwrap().code, "FUTURE_START_DATE");

        let wide = gw
            .execute(&call().with_arg("start_date", "2024-01-01").with_arg("end_date", "2026-01-01"))
            .await;
        let err = wide.error().unwrap();
        assert_eq!(err.code, "RANGE_TOO_WIDE");
        assert_eq!(err.tier, ErrorTier::Recoverable);
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_call() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": [1]})));
        let gw = gateway(vec![adapter.clone()], GatewayConfig::default());

        let result = gw
            .execute(&ToolCall::new("verified_price").with_arg("unknown", "x"))
            .await;
        assert_eq!(result.error().unwrap().code, "INVALID_ARGUMENT");
        assert_eq!(adapter.calls(), 0);

        let unknown = gw.execute(&ToolCall::new("nope")).await;
        assert_eq!(unknown.error().unwrap().code, "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn test_error_caching_is_opt_in() {
        let adapter = Arc::new(CountingAdapter::failing(
            price_tool(),
            AdapterError::NotFound("600519.SH".into()),
        ));
        let gw = gateway(vec![adapter.clone()], GatewayConfig::default().with_error_caching(30));

        let first = gw.execute(&call()).await;
        let second = gw.execute(&call()).await;
        assert!(!first.is_success());
        assert!(!second.is_success());
        assert!(second.metadata.cached);
        assert_eq!(second.error().unwrap().code, "NOT_FOUND");
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_calls_are_flagged() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({"data": [1]})));
        let gw = gateway(vec![adapter], GatewayConfig::default().with_slow_call_ms(0));

        let result = gw.execute(&call()).await;
        assert!(result.metadata.slow);
        assert_eq!(gw.stats().slow_calls, 1);
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_prepare_reports_dropped_params() {
        let adapter = Arc::new(CountingAdapter::new(price_tool(), json!({})));
        let gw = gateway(vec![adapter], GatewayConfig::default());

        let prepared = gw
            .prepare(&ToolCall::new("stock_price").with_arg("symbol", "600519.SH").with_arg("limit", 5))
            .unwrap();
        assert_eq!(prepared.call.tool_name, "verified_price");
        assert_eq!(prepared.call.arguments["entity_code"], json!("600519.SH"));
        assert!(prepared.warnings.is_empty());
    }
}
