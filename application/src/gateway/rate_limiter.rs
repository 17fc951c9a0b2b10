//! Per-tool rate limiter
//!
//! Owned by the gateway and parameterized per tool. A sliding window over
//! two fast-cache counters (`rl:{tool}:{window}`): the previous window's
//! count is weighted by how much of it still overlaps the trailing window.
//! Counting uses the cache's atomic increment so concurrent agents share one
//! budget. Calls over budget are rejected immediately and give their slot
//! back; nothing is retried internally.

use std::collections::HashMap;
use std::sync::Arc;

use tribunal_domain::ToolError;

use crate::config::{GatewayConfig, RateLimit};
use crate::ports::clock::Clock;
use crate::ports::fast_cache::{CacheError, FastCache};

fn window_key(tool: &str, window: u64) -> String {
    format!("rl:{}:{}", tool, window)
}

pub struct RateLimiter {
    cache: Arc<dyn FastCache>,
    clock: Arc<dyn Clock>,
    default_limit: RateLimit,
    limits: HashMap<String, RateLimit>,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn FastCache>, clock: Arc<dyn Clock>, config: &GatewayConfig) -> Self {
        Self {
            cache,
            clock,
            default_limit: config.default_rate_limit,
            limits: config.rate_limits.clone(),
        }
    }

    pub fn limit_for(&self, tool: &str) -> RateLimit {
        self.limits.get(tool).copied().unwrap_or(self.default_limit)
    }

    /// Count one call against the tool's budget over the trailing window.
    ///
    /// `Ok(Err(_))` is a Recoverable `RATE_LIMITED` rejection; `Err(_)` is a
    /// cache failure.
    pub async fn acquire(&self, tool: &str) -> Result<Result<(), ToolError>, CacheError> {
        let limit = self.limit_for(tool);
        let window_ms = limit.window_secs.max(1).saturating_mul(1000);
        let now_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let window = now_ms / window_ms;
        let into_window = now_ms % window_ms;

        let previous = match window.checked_sub(1) {
            Some(prev) => self
                .cache
                .get(&window_key(tool, prev))
                .await?
                .and_then(|v| v.as_i64())
                .unwrap_or(0),
            None => 0,
        };
        let current_key = window_key(tool, window);
        // Kept for two windows so it can serve as the next window's previous
        let current = self
            .cache
            .incr(&current_key, 1, Some(limit.window().saturating_mul(2)))
            .await?;

        let overlap = (window_ms - into_window) as f64 / window_ms as f64;
        let estimate = previous as f64 * overlap + current as f64;
        if estimate > f64::from(limit.max_calls) {
            self.cache.incr(&current_key, -1, None).await?;
            tracing::warn!(
                tool,
                estimate,
                max = limit.max_calls,
                "Rate limit exceeded"
            );
            return Ok(Err(ToolError::rate_limited(
                tool,
                limit.max_calls,
                limit.window_secs,
            )));
        }
        Ok(Ok(()))
    }
}
