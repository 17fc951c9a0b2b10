//! Agent turn state
//!
//! One turn is a bounded THINK → ACT → OBSERVE → … → SPEAK cycle. The
//! phases are strictly sequential within a turn; the record keeps every
//! step so the transcript and the audit can see what the agent did.

use serde::{Deserialize, Serialize};

use super::agent::AgentId;
use crate::evidence::entities::EvidenceId;
use crate::tool::entities::Params;
use crate::tool::value_objects::ErrorTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Think,
    Act,
    Observe,
    Speak,
}

impl TurnPhase {
    pub fn as_str(&self) -> &str {
        match self {
            TurnPhase::Think => "think",
            TurnPhase::Act => "act",
            TurnPhase::Observe => "observe",
            TurnPhase::Speak => "speak",
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnStep {
    pub phase: TurnPhase,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Identical call already made this turn
    Loop,
    /// Parameters name an entity other than the locked one
    FactLock,
    /// No equipped tool can serve the request
    NotEquipped,
}

/// What happened to one requested tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CallOutcome {
    Observed {
        evidence_id: EvidenceId,
        /// Served from working memory without a gateway call
        from_memory: bool,
        /// The result set was empty
        empty: bool,
    },
    Failed {
        tier: ErrorTier,
        code: String,
        message: String,
    },
    Blocked {
        kind: BlockKind,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub requested: String,
    /// Tool actually invoked after alias resolution and redirection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    pub params: Params,
    #[serde(flatten)]
    pub outcome: CallOutcome,
}

impl ToolCallRecord {
    pub fn evidence_id(&self) -> Option<&EvidenceId> {
        match &self.outcome {
            CallOutcome::Observed {
                evidence_id,
                empty: false,
                ..
            } => Some(evidence_id),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.outcome, CallOutcome::Blocked { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub agent_id: AgentId,
    pub team: String,
    pub round: usize,
    pub steps: Vec<TurnStep>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub statement: String,
    /// The step budget ran out and the statement was forced
    pub forced: bool,
    /// Warnings injected into this turn's prompts
    pub warnings: Vec<String>,
}

impl TurnRecord {
    pub fn new(agent_id: AgentId, team: impl Into<String>, round: usize) -> Self {
        Self {
            agent_id,
            team: team.into(),
            round,
            steps: Vec::new(),
            tool_calls: Vec::new(),
            statement: String::new(),
            forced: false,
            warnings: Vec::new(),
        }
    }

    pub fn push_step(&mut self, phase: TurnPhase, content: impl Into<String>) {
        self.steps.push(TurnStep {
            phase,
            content: content.into(),
        });
    }

    /// Non-empty evidence observed during the turn.
    pub fn evidence_ids(&self) -> Vec<EvidenceId> {
        let mut ids: Vec<EvidenceId> = Vec::new();
        for id in self.tool_calls.iter().filter_map(|c| c.evidence_id()) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn blocked_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|c| c.is_blocked())
    }

    pub fn blocked_by(&self, kind: BlockKind) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(move |c| {
            matches!(&c.outcome, CallOutcome::Blocked { kind: k, .. } if *k == kind)
        })
    }

    /// Number of ACT steps taken.
    pub fn actions(&self) -> usize {
        self.steps.iter().filter(|s| s.phase == TurnPhase::Act).count()
    }
}
