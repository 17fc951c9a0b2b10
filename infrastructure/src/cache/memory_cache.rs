//! In-process [`FastCache`] with lazy expiry.
//!
//! Expired keys are dropped when touched; [`InMemoryFastCache::purge_expired`]
//! sweeps the rest. Expiry is judged against the injected clock.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;
use tribunal_application::ports::clock::Clock;
use tribunal_application::ports::fast_cache::{CacheError, FastCache};
use tribunal_domain::Timestamp;
use tribunal_domain::core::clock::add_duration;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Timestamp>,
}

impl Entry {
    fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

pub struct InMemoryFastCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryFastCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))
    }

    /// Live entry for `key`, dropping it first if it has expired.
    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Timestamp,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    /// Drop every expired key. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "Purged expired cache keys");
        }
        Ok(purged)
    }

    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FastCache for InMemoryFastCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        Ok(Self::live_entry(&mut entries, key, now).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|t| add_duration(self.clock.now(), t));
        self.lock()?
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        Ok(entries.remove(key).is_some_and(|e| e.is_live(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(add_duration(now, ttl));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                let current = entry.value.as_i64().ok_or_else(|| CacheError::NotACounter {
                    key: key.to_string(),
                })?;
                let next = current.saturating_add(by);
                entry.value = Value::from(next);
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::from(by),
                        expires_at: ttl.map(|t| add_duration(now, t)),
                    },
                );
                Ok(by)
            }
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = self.clock.now();
        let entries = self.lock()?;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
