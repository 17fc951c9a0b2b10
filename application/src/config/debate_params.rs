//! Debate parameters: use case loop control.

use serde::{Deserialize, Serialize};

/// Debate loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateParams {
    /// Number of rounds after the fact lock
    pub rounds: usize,
    /// Maximum completion calls per agent turn before a forced statement
    pub max_steps: usize,
    /// Concurrent outbound completion calls
    pub max_concurrency: usize,
    /// Transcript entries included in each turn prompt
    pub recent_entries: usize,
    /// Long-term memory hits included in each turn prompt
    pub memory_hints: usize,
}

impl Default for DebateParams {
    fn default() -> Self {
        Self {
            rounds: 2,
            max_steps: 6,
            max_concurrency: 4,
            recent_entries: 12,
            memory_hints: 3,
        }
    }
}

impl DebateParams {
    // ==================== Builder Methods ====================

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }
}
