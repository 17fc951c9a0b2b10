//! Hippocampal memory configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tribunal_domain::{ImportanceModel, ImportanceWeights};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub weights: ImportanceWeights,
    /// Half-life of the recency signal
    pub recency_half_life_secs: u64,
    /// Items scoring below this are evicted by cleanup
    pub eviction_threshold: f64,
    /// Items scoring at least this are promoted to long-term memory
    pub promotion_threshold: f64,
    /// Entries per semantic-index write
    pub consolidation_batch_size: usize,
    /// Interval of the background consolidation loop
    pub consolidation_interval_secs: u64,
    /// Volatile working-memory hits older than this are flagged stale
    pub stale_after_secs: u64,
    /// Volatile long-term hits older than this get a staleness warning
    pub long_term_stale_days: u64,
    /// Adoption may stretch an item's TTL up to this multiple
    pub ttl_extension_cap: u32,
    /// Default result count for shared-memory search
    pub search_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            weights: ImportanceWeights::default(),
            recency_half_life_secs: 6 * 60 * 60,
            eviction_threshold: 0.2,
            promotion_threshold: 0.7,
            consolidation_batch_size: 32,
            consolidation_interval_secs: 300,
            stale_after_secs: 15 * 60,
            long_term_stale_days: 3,
            ttl_extension_cap: 4,
            search_limit: 5,
        }
    }
}

impl MemoryConfig {
    /// Importance model with weights normalized to sum to 1.
    pub fn importance_model(&self) -> ImportanceModel {
        let total = self.weights.total();
        let weights = if total > 0.0 {
            ImportanceWeights {
                adoption: self.weights.adoption / total,
                trust: self.weights.trust / total,
                recency: self.weights.recency / total,
            }
        } else {
            ImportanceWeights::default()
        };
        ImportanceModel {
            weights,
            recency_half_life: Duration::from_secs(self.recency_half_life_secs),
        }
    }

    pub fn consolidation_interval(&self) -> Duration {
        Duration::from_secs(self.consolidation_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn long_term_stale_after(&self) -> Duration {
        Duration::from_secs(self.long_term_stale_days * 86_400)
    }

    // ==================== Builder Methods ====================

    pub fn with_thresholds(mut self, eviction: f64, promotion: f64) -> Self {
        self.eviction_threshold = eviction;
        self.promotion_threshold = promotion;
        self
    }

    pub fn with_weights(mut self, weights: ImportanceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.consolidation_batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_50_40_10() {
        let model = MemoryConfig::default().importance_model();
        assert!((model.weights.adoption - 0.5).abs() < 1e-9);
        assert!((model.weights.trust - 0.4).abs() < 1e-9);
        assert!((model.weights.recency - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_weights_are_normalized() {
        let config = MemoryConfig::default().with_weights(ImportanceWeights {
            adoption: 5.0,
            trust: 4.0,
            recency: 1.0,
        });
        let model = config.importance_model();
        assert!((model.weights.total() - 1.0).abs() < 1e-9);
        assert!((model.weights.adoption - 0.5).abs() < 1e-9);
    }
}
