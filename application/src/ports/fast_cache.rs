//! Fast cache port
//!
//! Key/value store with TTL and atomic increment. Backs the gateway result
//! cache, working memory and rate-limit counters.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache value for '{key}' is not a counter")]
    NotACounter { key: String },

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Overwrite a key. `None` means no expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Reset the TTL of an existing key. Returns whether the key existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Atomically add `by` to an integer key, creating it with `ttl` when
    /// absent. Returns the new value.
    async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64, CacheError>;

    /// Live keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}
