//! Debate checkpoints for context handoff.

use serde::{Deserialize, Serialize};

use super::entities::EvidenceId;
use crate::core::clock::Timestamp;

/// Snapshot of accumulated context after a round, plus the evidence it cites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub session_id: String,
    pub round: usize,
    /// Condensed transcript and standing corrections
    pub summary: String,
    pub evidence_ids: Vec<EvidenceId>,
    pub created_at: Timestamp,
}

impl Checkpoint {
    pub fn new(
        session_id: impl Into<String>,
        round: usize,
        summary: impl Into<String>,
        evidence_ids: Vec<EvidenceId>,
        created_at: Timestamp,
    ) -> Self {
        let session_id = session_id.into();
        Self {
            id: format!("{}:round-{}", session_id, round),
            session_id,
            round,
            summary: summary.into(),
            evidence_ids,
            created_at,
        }
    }
}
