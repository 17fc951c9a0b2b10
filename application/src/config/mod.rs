//! Application-level configuration.
//!
//! This module provides configuration types that control how the services
//! and use cases behave:
//!
//! - [`GatewayConfig`]: rate limits, slow-call threshold, error caching, TTL overrides, guardrails
//! - [`MemoryConfig`]: importance weights, thresholds, consolidation and staleness
//! - [`DebateParams`]: rounds, step budget, completion concurrency
//! - [`TribunalConfig`]: container for all three, with validation

pub mod debate_params;
pub mod gateway_config;
pub mod memory_config;
pub mod tribunal_config;

pub use debate_params::DebateParams;
pub use gateway_config::{GatewayConfig, RateLimit};
pub use memory_config::MemoryConfig;
pub use tribunal_config::{ConfigValidationError, TribunalConfig};
