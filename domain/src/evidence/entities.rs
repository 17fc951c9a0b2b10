//! Evidence entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::sanity::{SanityVerdict, inspect_payload};
use crate::core::clock::{Timestamp, add_duration};
use crate::core::error::DomainError;
use crate::tool::entities::{LifecycleClass, Params};
use crate::tool::params::inputs_hash;
use crate::tool::value_objects::{ToolError, ToolResult};

/// Trust score assigned at ingest.
pub const TRUST_DRAFT: u8 = 50;
/// Trust score after passing verification.
pub const TRUST_VERIFIED: u8 = 80;
/// Trust score after failing verification.
pub const TRUST_QUARANTINE: u8 = 10;

const TRUST_CONFIRM_BONUS: u8 = 10;
const TRUST_DISPUTE_PENALTY: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for EvidenceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EvidenceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    Draft,
    Verified,
    Quarantine,
    Stale,
    Archived,
}

impl EvidenceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EvidenceStatus::Draft => "DRAFT",
            EvidenceStatus::Verified => "VERIFIED",
            EvidenceStatus::Quarantine => "QUARANTINE",
            EvidenceStatus::Stale => "STALE",
            EvidenceStatus::Archived => "ARCHIVED",
        }
    }

    /// Allowed forward transitions.
    pub fn can_transition_to(&self, next: EvidenceStatus) -> bool {
        use EvidenceStatus::*;
        matches!(
            (self, next),
            (Draft, Verified)
                | (Draft, Quarantine)
                | (Verified, Stale)
                | (Verified, Archived)
                | (Stale, Archived)
                | (Quarantine, Archived)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EvidenceStatus::Archived)
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationEventKind {
    Ingested,
    Verified,
    Quarantined,
    Staled,
    Archived,
    /// Cited by a statement that passed audit
    Confirmed,
    /// Listed as disputed by the chairman
    Disputed,
    /// Expiry pushed out by working-memory reuse
    Renewed,
}

/// One entry of the append-only verification log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub kind: VerificationEventKind,
    pub at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The atomic unit of fact: a tool result with provenance and lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDoc {
    pub id: EvidenceId,
    pub session_id: String,
    pub agent_id: String,

    pub tool_name: String,
    pub params: Params,
    pub inputs_hash: String,
    /// Free-form provenance (model, run id, adapter version, ...)
    #[serde(default)]
    pub provenance: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Set when the tool call itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_error: Option<ToolError>,
    #[serde(default)]
    pub lifecycle: LifecycleClass,

    pub status: EvidenceStatus,
    pub trust_score: u8,
    pub events: Vec<VerificationEvent>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Set only when the record becomes VERIFIED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_expiry: Option<Timestamp>,
}

impl EvidenceDoc {
    /// New DRAFT record for a gateway result.
    pub fn draft(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        params: Params,
        result: &ToolResult,
        now: Timestamp,
    ) -> Self {
        let hash = result
            .metadata
            .cache_key
            .clone()
            .unwrap_or_else(|| inputs_hash(&result.tool_name, &params));
        Self {
            id: EvidenceId::new(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            tool_name: result.tool_name.clone(),
            params,
            inputs_hash: hash,
            provenance: BTreeMap::new(),
            payload: result.payload.clone(),
            tool_error: result.error.clone(),
            lifecycle: LifecycleClass::default(),
            status: EvidenceStatus::Draft,
            trust_score: TRUST_DRAFT,
            events: vec![VerificationEvent {
                kind: VerificationEventKind::Ingested,
                at: now,
                detail: None,
            }],
            created_at: now,
            updated_at: now,
            ttl_expiry: None,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleClass) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_provenance(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provenance.insert(key.into(), value.into());
        self
    }

    /// Run the sanity pass on a DRAFT record.
    ///
    /// A failed tool call, an explicit provider error or an empty canonical
    /// data array sends the record to QUARANTINE; anything else becomes
    /// VERIFIED with `ttl_expiry = now + ttl`.
    pub fn verify(&mut self, ttl: Duration, now: Timestamp) -> Result<EvidenceStatus, DomainError> {
        let verdict = match &self.tool_error {
            Some(err) => SanityVerdict::Reject(format!("tool call failed: {}", err)),
            None => inspect_payload(self.payload.as_ref()),
        };

        match verdict {
            SanityVerdict::Pass => {
                self.transition(EvidenceStatus::Verified, VerificationEventKind::Verified, None, now)?;
                self.trust_score = TRUST_VERIFIED;
                self.ttl_expiry = Some(add_duration(now, ttl));
            }
            SanityVerdict::Reject(reason) => {
                self.transition(
                    EvidenceStatus::Quarantine,
                    VerificationEventKind::Quarantined,
                    Some(reason),
                    now,
                )?;
                self.trust_score = TRUST_QUARANTINE;
            }
        }
        Ok(self.status)
    }

    /// VERIFIED → STALE once the TTL has elapsed. Returns whether it moved.
    pub fn age(&mut self, now: Timestamp) -> Result<bool, DomainError> {
        if self.status == EvidenceStatus::Verified && self.is_expired(now) {
            self.transition(EvidenceStatus::Stale, VerificationEventKind::Staled, None, now)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn archive(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition(
            EvidenceStatus::Archived,
            VerificationEventKind::Archived,
            Some(reason.into()),
            now,
        )
    }

    /// Record that a statement citing this evidence passed audit.
    pub fn confirm(&mut self, now: Timestamp) {
        self.trust_score = self.trust_score.saturating_add(TRUST_CONFIRM_BONUS).min(100);
        self.log(VerificationEventKind::Confirmed, None, now);
    }

    /// Record that the chairman disputed this evidence.
    pub fn dispute(&mut self, reason: impl Into<String>, now: Timestamp) {
        self.trust_score = self.trust_score.saturating_sub(TRUST_DISPUTE_PENALTY);
        self.log(VerificationEventKind::Disputed, Some(reason.into()), now);
    }

    /// Push the expiry of trusted evidence out to `until`. Returns whether
    /// it moved; expired or non-VERIFIED records are left alone.
    pub fn renew(&mut self, until: Timestamp, now: Timestamp) -> bool {
        if !self.is_trusted(now) || self.ttl_expiry.is_some_and(|expiry| expiry >= until) {
            return false;
        }
        self.ttl_expiry = Some(until);
        self.log(VerificationEventKind::Renewed, None, now);
        true
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.ttl_expiry.is_some_and(|expiry| now >= expiry)
    }

    /// VERIFIED and within TTL: the only evidence that may be cited.
    pub fn is_trusted(&self, now: Timestamp) -> bool {
        self.status == EvidenceStatus::Verified && !self.is_expired(now)
    }

    pub fn was_disputed(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.kind == VerificationEventKind::Disputed)
    }

    /// Reason recorded by the most recent quarantine, if any.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.events
            .iter()
            .rev()
            .find(|e| e.kind == VerificationEventKind::Quarantined)
            .and_then(|e| e.detail.as_deref())
    }

    fn transition(
        &mut self,
        next: EvidenceStatus,
        kind: VerificationEventKind,
        detail: Option<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.log(kind, detail, now);
        Ok(())
    }

    fn log(&mut self, kind: VerificationEventKind, detail: Option<String>, now: Timestamp) {
        self.events.push(VerificationEvent {
            kind,
            at: now,
            detail,
        });
        self.updated_at = now;
    }
}
