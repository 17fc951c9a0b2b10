//! In-process doubles for the application ports.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tribunal_domain::core::clock::add_duration;
use tribunal_domain::{
    AdapterError, Checkpoint, EvidenceDoc, EvidenceId, EvidenceStatus, LongTermMemoryEntry,
    Message, Params, Role, SearchFilter, SearchHit, Timestamp, ToolAdapter, ToolDefinition,
};

use crate::ports::clock::Clock;
use crate::ports::completion::{Completion, CompletionError, CompletionService};
use crate::ports::evidence_store::{EvidenceStore, StoreError};
use crate::ports::fast_cache::{CacheError, FastCache};
use crate::ports::semantic_index::{IndexError, SemanticIndex};

/// Monday 2026-03-02 12:00 UTC
pub fn fixed_now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

// ==================== Fast cache ====================

pub struct MapCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (Value, Option<Timestamp>)>>,
}

impl MapCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn live<'a>(
        entries: &'a mut HashMap<String, (Value, Option<Timestamp>)>,
        key: &str,
        now: Timestamp,
    ) -> Option<&'a mut (Value, Option<Timestamp>)> {
        if entries
            .get(key)
            .is_some_and(|(_, exp)| exp.is_some_and(|e| now >= e))
        {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

#[async_trait]
impl FastCache for MapCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        Ok(Self::live(&mut entries, key, self.clock.now()).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expiry = ttl.map(|t| add_duration(self.clock.now(), t));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, expiry));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let existed = Self::live(&mut entries, key, self.clock.now()).is_some();
        entries.remove(key);
        Ok(existed)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match Self::live(&mut entries, key, now) {
            Some(entry) => {
                entry.1 = Some(add_duration(now, ttl));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match Self::live(&mut entries, key, now) {
            Some(entry) => {
                let current = entry.0.as_i64().ok_or_else(|| CacheError::NotACounter {
                    key: key.to_string(),
                })?;
                entry.0 = Value::from(current + by);
                Ok(current + by)
            }
            None => {
                let expiry = ttl.map(|t| add_duration(now, t));
                entries.insert(key.to_string(), (Value::from(by), expiry));
                Ok(by)
            }
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, (_, exp))| k.starts_with(prefix) && !exp.is_some_and(|e| now >= e))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

// ==================== Semantic index ====================

/// Scores entries by the share of query words they contain.
#[derive(Default)]
pub struct KeywordIndex {
    collections: Mutex<HashMap<String, Vec<LongTermMemoryEntry>>>,
    upserts: AtomicUsize,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upsert calls (batches) received.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn entries(&self, collection: &str) -> Vec<LongTermMemoryEntry> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '.')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl SemanticIndex for KeywordIndex {
    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<LongTermMemoryEntry>,
    ) -> Result<usize, IndexError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let count = entries.len();
        let mut collections = self.collections.lock().unwrap();
        let stored = collections.entry(collection.to_string()).or_default();
        for entry in entries {
            stored.retain(|e| e.id != entry.id);
            stored.push(entry);
        }
        Ok(count)
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let query = words(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let collections = self.collections.lock().unwrap();
        let mut hits: Vec<SearchHit> = collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|e| filter.matches(&e.metadata))
            .filter_map(|e| {
                let text = words(&e.text);
                let matched = query.iter().filter(|w| text.contains(w)).count();
                (matched > 0).then(|| SearchHit::new(e.clone(), matched as f32 / query.len() as f32))
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

// ==================== Evidence store ====================

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<EvidenceId, EvidenceDoc>>,
    checkpoints: Mutex<Vec<Checkpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }
}

#[async_trait]
impl EvidenceStore for MemoryStore {
    async fn create(&self, doc: &EvidenceDoc) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        if docs.contains_key(&doc.id) {
            return Err(StoreError::Conflict(doc.id.to_string()));
        }
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn update(&self, doc: &EvidenceDoc) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        match docs.get_mut(&doc.id) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(doc.id.to_string())),
        }
    }

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceDoc>, StoreError> {
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }

    async fn query_by_status(&self, status: EvidenceStatus) -> Result<Vec<EvidenceDoc>, StoreError> {
        let mut found: Vec<EvidenceDoc> = self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|d| d.created_at);
        Ok(found)
    }

    async fn find_by_hash(&self, inputs_hash: &str) -> Result<Vec<EvidenceDoc>, StoreError> {
        let mut found: Vec<EvidenceDoc> = self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.inputs_hash == inputs_hash)
            .cloned()
            .collect();
        found.sort_by_key(|d| d.created_at);
        Ok(found)
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let mut checkpoints = self.checkpoints.lock().unwrap();
        checkpoints.retain(|c| c.id != checkpoint.id);
        checkpoints.push(checkpoint.clone());
        Ok(())
    }

    async fn latest_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self
            .checkpoints
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.session_id == session_id)
            .max_by_key(|c| c.round)
            .cloned())
    }
}

// ==================== Tool adapter ====================

pub struct CountingAdapter {
    definition: ToolDefinition,
    response: Result<Value, AdapterError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Params>>,
}

impl CountingAdapter {
    pub fn new(definition: ToolDefinition, payload: Value) -> Self {
        Self {
            definition,
            response: Ok(payload),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(definition: ToolDefinition, error: AdapterError) -> Self {
        Self {
            definition,
            response: Err(error),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Params> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolAdapter for CountingAdapter {
    fn describe(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, params: &Params) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());
        self.response.clone()
    }
}

// ==================== Completion ====================

/// Replays queued responses per agent, routed on the `Agent ID:` line
/// that opens every system prompt.
#[derive(Default)]
pub struct ScriptedCompletion {
    scripts: Mutex<HashMap<String, VecDeque<Completion>>>,
    fallbacks: HashMap<String, String>,
    requests: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, agent: &str, responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.script_completions(agent, responses.into_iter().map(|r| Completion::text(r)))
    }

    pub fn script_completions(
        self,
        agent: &str,
        responses: impl IntoIterator<Item = Completion>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .extend(responses);
        self
    }

    /// Answer used once an agent's queue is exhausted.
    pub fn with_fallback(mut self, agent: &str, text: impl Into<String>) -> Self {
        self.fallbacks.insert(agent.to_string(), text.into());
        self
    }

    /// Message lists sent on behalf of `agent`, in call order.
    pub fn requests_for(&self, agent: &str) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

pub fn agent_of(messages: &[Message]) -> String {
    messages
        .iter()
        .find(|m| m.role == Role::System)
        .and_then(|m| m.content.lines().next())
        .and_then(|line| line.strip_prefix("Agent ID:"))
        .map(|id| id.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Completion, CompletionError> {
        let agent = agent_of(messages);
        self.requests
            .lock()
            .unwrap()
            .push((agent.clone(), messages.to_vec()));

        if let Some(next) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&agent)
            .and_then(|q| q.pop_front())
        {
            return Ok(next);
        }
        self.fallbacks
            .get(&agent)
            .map(|text| Completion::text(text.clone()))
            .ok_or_else(|| CompletionError::RequestFailed(format!("no script for agent '{}'", agent)))
    }
}
