//! Gateway call statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use tribunal_domain::ErrorTier;

/// Lock-free counters updated on every gateway call.
#[derive(Debug, Default)]
pub struct GatewayStats {
    calls: AtomicU64,
    cache_hits: AtomicU64,
    adapter_calls: AtomicU64,
    rate_limited: AtomicU64,
    recoverable: AtomicU64,
    terminal: AtomicU64,
    fatal: AtomicU64,
    slow: AtomicU64,
}

impl GatewayStats {
    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_adapter_call(&self) {
        self.adapter_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_slow(&self) {
        self.slow.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, tier: ErrorTier) {
        let counter = match tier {
            ErrorTier::Recoverable => &self.recoverable,
            ErrorTier::Terminal => &self.terminal,
            ErrorTier::Fatal => &self.fatal,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            adapter_calls: self.adapter_calls.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            recoverable_failures: self.recoverable.load(Ordering::Relaxed),
            terminal_failures: self.terminal.load(Ordering::Relaxed),
            fatal_failures: self.fatal.load(Ordering::Relaxed),
            slow_calls: self.slow.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`GatewayStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStatsSnapshot {
    pub calls: u64,
    pub cache_hits: u64,
    pub adapter_calls: u64,
    pub rate_limited: u64,
    pub recoverable_failures: u64,
    pub terminal_failures: u64,
    pub fatal_failures: u64,
    pub slow_calls: u64,
}

impl GatewayStatsSnapshot {
    pub fn failures(&self) -> u64 {
        self.recoverable_failures + self.terminal_failures + self.fatal_failures
    }
}
