//! Working memory items and importance scoring
//!
//! Importance blends three signals into `[0, 1]`:
//!
//! | Signal | Default weight | Definition |
//! |--------|----------------|------------|
//! | adoption | 0.5 | `adopted / retrieved` (capped at 1) |
//! | trust | 0.4 | verification trust, confirmed/misleading feedback |
//! | recency | 0.1 | `0.5 ^ (age / half_life)` |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::clock::{Timestamp, elapsed};
use crate::evidence::entities::{EvidenceDoc, EvidenceId};
use crate::tool::entities::{LifecycleClass, Params};
use crate::tool::params::entity_code;

/// A cached VERIFIED tool result, keyed by `inputs_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingMemoryItem {
    pub key: String,
    pub evidence_id: EvidenceId,
    pub session_id: String,
    pub tool_name: String,
    pub params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_code: Option<String>,
    pub payload: serde_json::Value,
    pub trust_score: u8,
    pub lifecycle: LifecycleClass,
    pub long_term_eligible: bool,
    pub global_scope: bool,
    pub created_at: Timestamp,
    pub last_access: Timestamp,
    #[serde(default)]
    pub consolidated: bool,
}

impl WorkingMemoryItem {
    /// Build an item from VERIFIED evidence.
    pub fn from_evidence(doc: &EvidenceDoc, long_term_eligible: bool, global_scope: bool) -> Self {
        Self {
            key: doc.inputs_hash.clone(),
            evidence_id: doc.id.clone(),
            session_id: doc.session_id.clone(),
            tool_name: doc.tool_name.clone(),
            params: doc.params.clone(),
            entity_code: entity_code(&doc.params),
            payload: doc.payload.clone().unwrap_or(serde_json::Value::Null),
            trust_score: doc.trust_score,
            lifecycle: doc.lifecycle,
            long_term_eligible,
            global_scope,
            created_at: doc.created_at,
            last_access: doc.created_at,
            consolidated: false,
        }
    }
}

/// Usage counters, stored beside the item and updated atomically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounters {
    pub retrieved: u64,
    pub adopted: u64,
    pub success: u64,
    pub misleading: u64,
}

impl MemoryCounters {
    pub fn adoption_rate(&self) -> f64 {
        (self.adopted as f64 / self.retrieved.max(1) as f64).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceWeights {
    pub adoption: f64,
    pub trust: f64,
    pub recency: f64,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            adoption: 0.5,
            trust: 0.4,
            recency: 0.1,
        }
    }
}

impl ImportanceWeights {
    pub fn total(&self) -> f64 {
        self.adoption + self.trust + self.recency
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportanceModel {
    pub weights: ImportanceWeights,
    pub recency_half_life: Duration,
}

impl Default for ImportanceModel {
    fn default() -> Self {
        Self {
            weights: ImportanceWeights::default(),
            recency_half_life: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl ImportanceModel {
    pub fn score(&self, item: &WorkingMemoryItem, counters: &MemoryCounters, now: Timestamp) -> f64 {
        let trust = (item.trust_score as f64 / 100.0 + 0.1 * counters.success as f64
            - 0.25 * counters.misleading as f64)
            .clamp(0.0, 1.0);

        let half_life = self.recency_half_life.as_secs_f64().max(1.0);
        let age = elapsed(item.last_access, now).as_secs_f64();
        let recency = 0.5_f64.powf(age / half_life);

        let w = &self.weights;
        (w.adoption * counters.adoption_rate() + w.trust * trust + w.recency * recency)
            .clamp(0.0, 1.0)
    }
}

/// Base TTL stretched by adoptions: `base * (1 + adopted)`, capped at
/// `base * max_multiplier`.
pub fn effective_ttl(base: Duration, adopted: u64, max_multiplier: u32) -> Duration {
    let factor = (1 + adopted).min(max_multiplier.max(1) as u64) as u32;
    base.saturating_mul(factor)
}

/// Age annotation returned with every working-memory hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub age_secs: u64,
    pub volatile: bool,
    pub is_stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Freshness {
    /// Volatile data older than `stale_after` is flagged stale.
    pub fn assess(
        recorded_at: Timestamp,
        now: Timestamp,
        lifecycle: LifecycleClass,
        stale_after: Duration,
    ) -> Self {
        let age = elapsed(recorded_at, now);
        let volatile = lifecycle.is_volatile();
        let is_stale = volatile && age > stale_after;
        let warning = is_stale.then(|| {
            format!(
                "{} data is {}s old; confirm before relying on it",
                lifecycle,
                age.as_secs()
            )
        });
        Self {
            age_secs: age.as_secs(),
            volatile,
            is_stale,
            warning,
        }
    }
}
