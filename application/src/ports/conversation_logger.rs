//! Port for structured debate logging.
//!
//! Defines the [`ConversationLogger`] trait for recording debate events
//! (fact lock, statements, tool calls, audits, corrections, checkpoints) to
//! a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! debate transcript in a machine-readable format (JSONL).

use serde_json::{Value, json};
use tribunal_domain::{AuditReport, Checkpoint, FactLock, ToolCallRecord, TurnRecord};

/// A structured debate event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The timestamp is added by the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEvent {
    /// Event type identifier (e.g., "agent_statement", "tool_call", "audit").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn debate_started(session_id: &str, topic: &str, agents: &[String]) -> Self {
        Self::new(
            "debate_started",
            json!({"session_id": session_id, "topic": topic, "agents": agents}),
        )
    }

    pub fn fact_lock(lock: &FactLock) -> Self {
        Self::new("fact_lock", serde_json::to_value(lock).unwrap_or(Value::Null))
    }

    pub fn agent_statement(turn: &TurnRecord) -> Self {
        Self::new(
            "agent_statement",
            json!({
                "agent": turn.agent_id,
                "team": turn.team,
                "round": turn.round,
                "statement": turn.statement,
                "evidence": turn.evidence_ids(),
                "forced": turn.forced,
                "warnings": turn.warnings,
            }),
        )
    }

    pub fn tool_call(agent: &str, round: usize, record: &ToolCallRecord) -> Self {
        Self::new(
            "tool_call",
            json!({
                "agent": agent,
                "round": round,
                "call": serde_json::to_value(record).unwrap_or(Value::Null),
            }),
        )
    }

    pub fn audit(report: &AuditReport) -> Self {
        Self::new("audit", serde_json::to_value(report).unwrap_or(Value::Null))
    }

    pub fn correction(round: usize, text: &str) -> Self {
        Self::new("correction", json!({"round": round, "text": text}))
    }

    pub fn checkpoint(checkpoint: &Checkpoint) -> Self {
        Self::new(
            "checkpoint",
            json!({
                "id": checkpoint.id,
                "round": checkpoint.round,
                "evidence": checkpoint.evidence_ids,
            }),
        )
    }
}

/// Port for logging debate events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and infallible; write failures are ignored.
pub trait ConversationLogger: Send + Sync {
    /// Record a debate event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
