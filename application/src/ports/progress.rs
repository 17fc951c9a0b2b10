//! Progress notification port
//!
//! Defines the interface for reporting progress during a debate.

use tribunal_domain::{AgentId, AuditReport};

/// Callback for progress updates during a debate
///
/// Implementations live in the binary and can display progress in various
/// ways (console, structured logs, ...).
pub trait DebateProgress: Send + Sync {
    /// Called when a round starts
    fn on_round_start(&self, round: usize, total_rounds: usize);

    /// Called when an agent finishes its turn
    fn on_turn_complete(&self, agent: &AgentId, round: usize, forced: bool);

    /// Called when the chairman's audit of a round completes
    fn on_audit(&self, report: &AuditReport);

    /// Called after every tool call of any agent.
    fn on_tool_call(&self, _agent: &AgentId, _tool: &str, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DebateProgress for NoProgress {
    fn on_round_start(&self, _round: usize, _total_rounds: usize) {}
    fn on_turn_complete(&self, _agent: &AgentId, _round: usize, _forced: bool) {}
    fn on_audit(&self, _report: &AuditReport) {}
}
