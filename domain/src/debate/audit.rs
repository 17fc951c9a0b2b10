//! Arbitration
//!
//! After each round the chairman audits the team summaries. Deterministic
//! pre-checks run first so obvious violations are caught even when the
//! chairman's reply cannot be parsed; the chairman may then add findings,
//! dispute evidence and issue one binding correction.
//!
//! The chairman answers with an `audit` fence:
//!
//! ````text
//! ```audit
//! {"correction": "...", "disputed_evidence": ["<id>"], "findings": [{"agent": "quant_bull", "detail": "..."}]}
//! ```
//! ````

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::agent::{AgentId, DebateAgent};
use super::fact_lock::FactLock;
use super::intent::{extract_citations, extract_fenced_blocks};
use super::turn::{BlockKind, TurnRecord};
use crate::core::clock::Timestamp;
use crate::evidence::entities::EvidenceId;

/// Percentages, decimals and thousands-separated figures.
static NUMERIC_CLAIM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?\s*%|\b\d{1,3}(?:,\d{3})+(?:\.\d+)?\b|\b\d+\.\d+\b").ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Figures stated without any supporting evidence
    UnsupportedClaim,
    /// Conclusion outside the agent's discipline
    DisciplineViolation,
    /// Tool selection or claim contradicting the fact lock
    FactLockViolation,
    /// Raised by the chairman
    Chairman,
}

impl FindingKind {
    pub fn as_str(&self) -> &str {
        match self {
            FindingKind::UnsupportedClaim => "unsupported_claim",
            FindingKind::DisciplineViolation => "discipline_violation",
            FindingKind::FactLockViolation => "fact_lock_violation",
            FindingKind::Chairman => "chairman",
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    pub kind: FindingKind,
    pub detail: String,
}

impl AuditFinding {
    pub fn new(agent_id: Option<AgentId>, kind: FindingKind, detail: impl Into<String>) -> Self {
        Self {
            agent_id,
            kind,
            detail: detail.into(),
        }
    }
}

/// Binding instruction every subsequent turn must respect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub round: usize,
    pub text: String,
    pub issued_at: Timestamp,
}

/// Deterministic checks on one finished turn.
pub fn precheck(turn: &TurnRecord, agent: &DebateAgent, lock: Option<&FactLock>) -> Vec<AuditFinding> {
    let mut findings = Vec::new();
    let who = || Some(turn.agent_id.clone());

    let has_figures = NUMERIC_CLAIM
        .as_ref()
        .is_some_and(|re| re.is_match(&turn.statement));
    let supported = !turn.evidence_ids().is_empty() || !extract_citations(&turn.statement).is_empty();
    if has_figures && !supported {
        findings.push(AuditFinding::new(
            who(),
            FindingKind::UnsupportedClaim,
            "statement cites figures but no verified evidence was observed or cited",
        ));
    }

    if let Some(marker) = agent.discipline.violation_in(&turn.statement) {
        findings.push(AuditFinding::new(
            who(),
            FindingKind::DisciplineViolation,
            format!(
                "{} role drew a conclusion outside its discipline (\"{}\")",
                agent.discipline, marker
            ),
        ));
    }

    if let Some(lock) = lock {
        for call in turn.blocked_by(BlockKind::FactLock) {
            findings.push(AuditFinding::new(
                who(),
                FindingKind::FactLockViolation,
                format!("requested {} for a foreign entity", call.requested),
            ));
        }
        let foreign = lock.foreign_codes(&turn.statement);
        if !foreign.is_empty() {
            findings.push(AuditFinding::new(
                who(),
                FindingKind::FactLockViolation,
                format!(
                    "statement refers to {} while the session is locked to {}",
                    foreign.join(", "),
                    lock.entity_code
                ),
            ));
        }
    }

    findings
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChairmanFinding {
    pub agent: Option<String>,
    pub detail: String,
}

/// Parsed `audit` fence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChairmanVerdict {
    pub correction: Option<String>,
    pub disputed_evidence: Vec<EvidenceId>,
    pub findings: Vec<ChairmanFinding>,
}

impl ChairmanVerdict {
    /// Parse the first `audit` fence of a chairman response.
    pub fn parse(text: &str) -> Result<Self, String> {
        let block = extract_fenced_blocks(text, "audit")
            .into_iter()
            .next()
            .ok_or_else(|| "no audit block in chairman response".to_string())?;
        let mut verdict: ChairmanVerdict =
            serde_json::from_str(&block).map_err(|e| format!("invalid audit block: {}", e))?;
        if verdict
            .correction
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            verdict.correction = None;
        }
        Ok(verdict)
    }
}

/// Outcome of one round's arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub round: usize,
    pub findings: Vec<AuditFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
    pub disputed: Vec<EvidenceId>,
}

impl AuditReport {
    pub fn new(round: usize, prechecks: Vec<AuditFinding>) -> Self {
        Self {
            round,
            findings: prechecks,
            correction: None,
            disputed: Vec::new(),
        }
    }

    /// Fold the chairman's verdict into the pre-check findings.
    pub fn with_verdict(mut self, verdict: ChairmanVerdict, now: Timestamp) -> Self {
        for finding in verdict.findings {
            self.findings.push(AuditFinding::new(
                finding.agent.map(AgentId::new),
                FindingKind::Chairman,
                finding.detail,
            ));
        }
        self.disputed = verdict.disputed_evidence;
        self.correction = verdict.correction.map(|text| Correction {
            round: self.round,
            text,
            issued_at: now,
        });
        self
    }

    /// No finding names this agent.
    pub fn passed(&self, agent: &AgentId) -> bool {
        !self
            .findings
            .iter()
            .any(|f| f.agent_id.as_ref() == Some(agent))
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.correction.is_none() && self.disputed.is_empty()
    }
}
