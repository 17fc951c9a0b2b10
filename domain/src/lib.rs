//! Domain layer for tribunal
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and it
//! never reads the clock: every time-dependent function takes `now`.
//!
//! # Core Concepts
//!
//! ## Evidence
//!
//! Every tool result is wrapped in an [`EvidenceDoc`] and must pass a
//! deterministic sanity check before it may be cited:
//! DRAFT → VERIFIED / QUARANTINE → STALE → ARCHIVED.
//!
//! ## Hippocampal Memory
//!
//! - **Working memory**: exact-match, TTL-scoped cache of VERIFIED results,
//!   ranked by an importance score (adoption, trust, recency)
//! - **Long-term memory**: consolidated summaries searchable by meaning,
//!   partitioned per session plus a global macro collection
//!
//! ## Debate
//!
//! Agents run a bounded THINK → ACT → OBSERVE → SPEAK loop under a fact
//! lock; a chairman audits each round and may issue binding corrections.

pub mod core;
pub mod debate;
pub mod evidence;
pub mod memory;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use core::{
    clock::Timestamp,
    error::DomainError,
};
pub use debate::{
    AgentAction, AgentId, AuditFinding, AuditReport, BlockKind, CallOutcome, CategoryTable,
    ChairmanVerdict, Correction, DebateAgent, DebateTranscript, Discipline, EquipmentResolver,
    Equipped, FactLock, FindingKind, LoopCheck, LoopGuard, ToolCallRecord, ToolIntent,
    TranscriptEntry, TurnPhase, TurnRecord, parse_agent_output, precheck,
};
pub use evidence::{
    Checkpoint, EvidenceDoc, EvidenceId, EvidenceStatus, VerificationEvent, VerificationEventKind,
};
pub use memory::{
    Freshness, ImportanceModel, ImportanceWeights, LongTermMemoryEntry, LongTermMetadata,
    MemoryCollection, MemoryCounters, SearchFilter, SearchHit, WorkingMemoryItem,
};
pub use prompt::{CHAIRMAN_ID, ChairmanPromptTemplate, DebatePromptTemplate};
pub use session::entities::{Conversation, Message, Role};
pub use tool::{
    AdapterError, DefaultToolValidator, ErrorTier, GuardrailPolicies, LifecycleClass, ParamType,
    Params, ProviderPolicy, ToolAdapter, ToolCall, ToolCategory, ToolDefinition, ToolError,
    ToolParameter, ToolResult, ToolResultMetadata, ToolSpec, ToolValidator, TtlPolicy,
    classify_payload, inputs_hash, normalize_params,
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_tool_helpers_reachable_from_crate_root() {
        let definition = crate::ToolDefinition::new("verified_price", "Prices");
        let raw = json!({"colour": "red", "limit": 5})
            .as_object()
            .cloned()
            .unwrap();

        let normalized = crate::normalize_params(&definition, &raw);
        assert_eq!(normalized.dropped, vec!["colour".to_string()]);
        assert_eq!(
            crate::inputs_hash("verified_price", &normalized.params),
            crate::tool::inputs_hash("verified_price", &normalized.params)
        );
        assert!(crate::classify_payload(&json!({"data": [1]})).is_none());
    }
}
