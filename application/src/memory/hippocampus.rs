//! Working memory, feedback hooks, consolidation and shared search.

use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use tribunal_domain::core::clock::{add_duration, elapsed};
use tribunal_domain::memory::{effective_ttl, is_error_like};
use tribunal_domain::{
    EvidenceDoc, EvidenceId, EvidenceStatus, Freshness, ImportanceModel, LongTermMemoryEntry,
    MemoryCollection, MemoryCounters, Params, SearchFilter, SearchHit, ToolResult, ToolSpec,
    WorkingMemoryItem, inputs_hash,
};

use crate::config::MemoryConfig;
use crate::evidence::{EvidenceError, EvidenceLifecycle};
use crate::ports::clock::Clock;
use crate::ports::fast_cache::{CacheError, FastCache};
use crate::ports::semantic_index::{IndexError, SemanticIndex};

const ITEM_PREFIX: &str = "wm:";
const COUNTER_PREFIX: &str = "wmc:";
const COUNTERS: [&str; 4] = ["retrieved", "adopted", "success", "misleading"];

fn item_key(hash: &str) -> String {
    format!("{}{}", ITEM_PREFIX, hash)
}

fn counter_key(hash: &str, counter: &str) -> String {
    format!("{}{}:{}", COUNTER_PREFIX, hash, counter)
}

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error(transparent)]
    Evidence(#[from] EvidenceError),

    #[error("Working memory cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Long-term index error: {0}")]
    Index(#[from] IndexError),

    #[error("Corrupt working memory entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Feedback after an agent used a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceOutcome {
    /// The argument built on it held up
    Success,
    /// It turned out wrong or was disputed
    Misleading,
}

/// A working-memory hit with its freshness annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingMemoryHit {
    pub item: WorkingMemoryItem,
    pub counters: MemoryCounters,
    pub freshness: Freshness,
}

impl WorkingMemoryHit {
    pub fn payload(&self) -> &Value {
        &self.item.payload
    }
}

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub evicted: usize,
    pub promoted: usize,
    pub skipped_error_like: usize,
    pub batches: usize,
}

pub struct HippocampalMemory {
    lifecycle: Arc<EvidenceLifecycle>,
    cache: Arc<dyn FastCache>,
    index: Arc<dyn SemanticIndex>,
    clock: Arc<dyn Clock>,
    tool_spec: ToolSpec,
    config: MemoryConfig,
    model: ImportanceModel,
}

impl HippocampalMemory {
    pub fn new(
        lifecycle: Arc<EvidenceLifecycle>,
        cache: Arc<dyn FastCache>,
        index: Arc<dyn SemanticIndex>,
        clock: Arc<dyn Clock>,
        tool_spec: ToolSpec,
        config: MemoryConfig,
    ) -> Self {
        let model = config.importance_model();
        Self {
            lifecycle,
            cache,
            index,
            clock,
            tool_spec,
            config,
            model,
        }
    }

    pub fn lifecycle(&self) -> &Arc<EvidenceLifecycle> {
        &self.lifecycle
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // ==================== Write path ====================

    /// Ingest and verify a gateway result; cache it only when VERIFIED.
    pub async fn store(
        &self,
        session_id: &str,
        agent_id: &str,
        params: &Params,
        result: &ToolResult,
    ) -> Result<EvidenceDoc, MemoryError> {
        let doc = self
            .lifecycle
            .ingest_and_verify(session_id, agent_id, params, result)
            .await?;

        if doc.status != EvidenceStatus::Verified {
            debug!(evidence_id = %doc.id, status = %doc.status, "Not caching unverified evidence");
            return Ok(doc);
        }

        let (long_term_eligible, global_scope) = self
            .tool_spec
            .get(&doc.tool_name)
            .map(|def| (def.long_term_eligible, def.global_scope))
            .unwrap_or((true, false));
        let item = WorkingMemoryItem::from_evidence(&doc, long_term_eligible, global_scope);
        let counters = self.counters(&item.key).await?;
        self.write_item(&item, &counters).await?;
        debug!(evidence_id = %doc.id, key = %item.key, "Working memory item stored");
        Ok(doc)
    }

    // ==================== Read path ====================

    /// Exact-match lookup by canonical tool name and normalized params.
    ///
    /// A hit bumps the retrieval counter and slides the TTL; the backing
    /// evidence is renewed to the same expiry so it stays citable. Items
    /// whose evidence is no longer trusted are dropped and reported as a miss.
    pub async fn retrieve_working_memory(
        &self,
        tool: &str,
        params: &Params,
    ) -> Result<Option<WorkingMemoryHit>, MemoryError> {
        let hash = inputs_hash(tool, params);
        let Some(mut item) = self.load_item(&hash).await? else {
            debug!(tool, key = %hash, "Working memory miss");
            return Ok(None);
        };

        if self.lifecycle.trusted(&item.evidence_id).await?.is_none() {
            debug!(tool, evidence_id = %item.evidence_id, "Working memory item no longer trusted, dropping");
            self.forget(&hash).await?;
            return Ok(None);
        }

        let now = self.clock.now();
        self.cache
            .incr(&counter_key(&hash, "retrieved"), 1, Some(self.base_ttl(&item)))
            .await?;
        item.last_access = now;
        let counters = self.counters(&hash).await?;
        self.write_item(&item, &counters).await?;

        let freshness = Freshness::assess(item.created_at, now, item.lifecycle, self.config.stale_after());
        if freshness.is_stale {
            warn!(tool, age_secs = freshness.age_secs, "Serving stale volatile data from working memory");
        }
        debug!(tool, key = %hash, retrieved = counters.retrieved, "Working memory hit");
        Ok(Some(WorkingMemoryHit {
            item,
            counters,
            freshness,
        }))
    }

    // ==================== Feedback ====================

    /// The evidence was used in an argument. Extends the item's TTL.
    /// Returns false when no working-memory item backs the evidence.
    pub async fn mark_adopted(&self, evidence_id: &EvidenceId) -> Result<bool, MemoryError> {
        let hash = self.lifecycle.get(evidence_id).await?.inputs_hash;
        let Some(mut item) = self.load_item(&hash).await? else {
            return Ok(false);
        };
        self.cache
            .incr(&counter_key(&hash, "adopted"), 1, Some(self.base_ttl(&item)))
            .await?;
        item.last_access = self.clock.now();
        let counters = self.counters(&hash).await?;
        self.write_item(&item, &counters).await?;
        debug!(evidence_id = %evidence_id, adopted = counters.adopted, "Evidence adopted");
        Ok(true)
    }

    /// Record whether the evidence held up. Misleading outcomes lower
    /// future importance.
    pub async fn mark_outcome(
        &self,
        evidence_id: &EvidenceId,
        outcome: EvidenceOutcome,
    ) -> Result<bool, MemoryError> {
        let hash = self.lifecycle.get(evidence_id).await?.inputs_hash;
        let Some(item) = self.load_item(&hash).await? else {
            return Ok(false);
        };
        let counter = match outcome {
            EvidenceOutcome::Success => "success",
            EvidenceOutcome::Misleading => "misleading",
        };
        self.cache
            .incr(&counter_key(&hash, counter), 1, Some(self.base_ttl(&item)))
            .await?;
        debug!(evidence_id = %evidence_id, outcome = counter, "Evidence outcome recorded");
        Ok(true)
    }

    /// Importance of the item under `hash`, if it is cached.
    pub async fn importance(&self, hash: &str) -> Result<Option<f64>, MemoryError> {
        let Some(item) = self.load_item(hash).await? else {
            return Ok(None);
        };
        let counters = self.counters(hash).await?;
        Ok(Some(self.model.score(&item, &counters, self.clock.now())))
    }

    // ==================== Maintenance ====================

    /// Evict every item scoring below `threshold`, regardless of TTL.
    pub async fn cleanup_working_memory(&self, threshold: f64) -> Result<usize, MemoryError> {
        let now = self.clock.now();
        let mut evicted = 0;
        for (hash, item) in self.items().await? {
            let counters = self.counters(&hash).await?;
            let score = self.model.score(&item, &counters, now);
            if score < threshold {
                self.forget(&hash).await?;
                evicted += 1;
                debug!(key = %hash, tool = %item.tool_name, score, "Evicted low-importance item");
            }
        }
        if evicted > 0 {
            info!(evicted, threshold, "Working memory cleanup");
        }
        Ok(evicted)
    }

    /// Cleanup, then promote important, eligible, clean items to
    /// long-term memory in batches.
    pub async fn consolidate(&self) -> Result<ConsolidationReport, MemoryError> {
        let mut report = ConsolidationReport {
            evicted: self.cleanup_working_memory(self.config.eviction_threshold).await?,
            ..Default::default()
        };

        let now = self.clock.now();
        let mut pending: BTreeMap<String, Vec<(WorkingMemoryItem, MemoryCounters, LongTermMemoryEntry)>> =
            BTreeMap::new();

        for (hash, item) in self.items().await? {
            if item.consolidated || !item.long_term_eligible {
                continue;
            }
            let counters = self.counters(&hash).await?;
            let score = self.model.score(&item, &counters, now);
            if score < self.config.promotion_threshold {
                continue;
            }
            if is_error_like(&item.payload) {
                report.skipped_error_like += 1;
                debug!(key = %hash, tool = %item.tool_name, "Skipping error-like payload");
                continue;
            }
            let entry = LongTermMemoryEntry::from_item(&item, score);
            pending
                .entry(entry.collection.name())
                .or_default()
                .push((item, counters, entry));
        }

        let batch_size = self.config.consolidation_batch_size.max(1);
        for (collection, items) in pending {
            for chunk in items.chunks(batch_size) {
                let entries = chunk.iter().map(|(_, _, e)| e.clone()).collect();
                self.index.upsert(&collection, entries).await?;
                report.batches += 1;

                for (item, counters, _) in chunk {
                    let mut item = item.clone();
                    item.consolidated = true;
                    self.write_item(&item, counters).await?;
                    report.promoted += 1;
                }
            }
        }

        info!(
            evicted = report.evicted,
            promoted = report.promoted,
            skipped_error_like = report.skipped_error_like,
            batches = report.batches,
            "Consolidation complete"
        );
        Ok(report)
    }

    // ==================== Long-term search ====================

    /// Search the session collection and the global macro collection.
    ///
    /// Entries about another entity are excluded by the filter; volatile
    /// entries older than the long-term staleness threshold carry a warning.
    pub async fn search_shared_memory(
        &self,
        session_id: &str,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        let limit = self.config.search_limit;
        let now = self.clock.now();
        let threshold = self.config.long_term_stale_after();

        let collections = [
            MemoryCollection::Session(session_id.to_string()).name(),
            MemoryCollection::GlobalMacro.name(),
        ];
        let searches = collections
            .iter()
            .map(|name| self.index.search(name, query, filter, limit));
        let hits = try_join_all(searches).await?;

        let mut seen = HashSet::new();
        let mut hits: Vec<SearchHit> = hits
            .into_iter()
            .flatten()
            .filter(|h| filter.matches(&h.entry.metadata))
            .filter(|h| seen.insert(h.entry.id.clone()))
            .map(|h| h.annotate_staleness(now, threshold))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    // ==================== Internals ====================

    fn base_ttl(&self, item: &WorkingMemoryItem) -> Duration {
        self.lifecycle.ttl_policy().ttl_for(&item.tool_name)
    }

    async fn load_item(&self, hash: &str) -> Result<Option<WorkingMemoryItem>, MemoryError> {
        let key = item_key(hash);
        let Some(value) = self.cache.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| MemoryError::Corrupt {
                key,
                reason: e.to_string(),
            })
    }

    async fn items(&self) -> Result<Vec<(String, WorkingMemoryItem)>, MemoryError> {
        let mut items = Vec::new();
        for key in self.cache.keys(ITEM_PREFIX).await? {
            let hash = key.trim_start_matches(ITEM_PREFIX).to_string();
            match self.load_item(&hash).await {
                Ok(Some(item)) => items.push((hash, item)),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable working memory entry"),
            }
        }
        Ok(items)
    }

    async fn counters(&self, hash: &str) -> Result<MemoryCounters, MemoryError> {
        let mut values = [0u64; 4];
        for (slot, name) in values.iter_mut().zip(COUNTERS) {
            *slot = self
                .cache
                .get(&counter_key(hash, name))
                .await?
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
        }
        let [retrieved, adopted, success, misleading] = values;
        Ok(MemoryCounters {
            retrieved,
            adopted,
            success,
            misleading,
        })
    }

    /// Write the item with its remaining lifetime, anchored at `last_access`
    /// and stretched by adoptions. Counter keys and the evidence expiry
    /// follow the item's expiry.
    async fn write_item(
        &self,
        item: &WorkingMemoryItem,
        counters: &MemoryCounters,
    ) -> Result<(), MemoryError> {
        let ttl = effective_ttl(
            self.base_ttl(item),
            counters.adopted,
            self.config.ttl_extension_cap,
        );
        let remaining = ttl.saturating_sub(elapsed(item.last_access, self.clock.now()));
        if remaining.is_zero() {
            return Ok(());
        }

        let value = serde_json::to_value(item).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache.set(&item_key(&item.key), value, Some(remaining)).await?;
        for name in COUNTERS {
            self.cache.expire(&counter_key(&item.key, name), remaining).await?;
        }
        let until = add_duration(self.clock.now(), remaining);
        self.lifecycle.renew(&item.evidence_id, until).await?;
        Ok(())
    }

    async fn forget(&self, hash: &str) -> Result<(), MemoryError> {
        self.cache.delete(&item_key(hash)).await?;
        for name in COUNTERS {
            self.cache.delete(&counter_key(hash, name)).await?;
        }
        Ok(())
    }
}
