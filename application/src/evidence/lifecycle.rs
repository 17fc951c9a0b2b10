//! Ingest, verify, age and archive evidence.
//!
//! The lifecycle is append-only: a record never returns to VERIFIED once it
//! left it. Fresher data means a new tool call and a new record.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use tribunal_domain::core::clock::elapsed;
use tribunal_domain::{
    DomainError, EvidenceDoc, EvidenceId, EvidenceStatus, Params, Timestamp, ToolResult,
    TtlPolicy,
};

use crate::ports::clock::Clock;
use crate::ports::evidence_store::{EvidenceStore, StoreError};

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Evidence not found: {0}")]
    NotFound(EvidenceId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub struct EvidenceLifecycle {
    store: Arc<dyn EvidenceStore>,
    clock: Arc<dyn Clock>,
    ttl_policy: TtlPolicy,
}

impl EvidenceLifecycle {
    pub fn new(store: Arc<dyn EvidenceStore>, clock: Arc<dyn Clock>, ttl_policy: TtlPolicy) -> Self {
        Self {
            store,
            clock,
            ttl_policy,
        }
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl_policy
    }

    pub fn store(&self) -> &Arc<dyn EvidenceStore> {
        &self.store
    }

    /// Record a tool call attempt as DRAFT. Never judges the result.
    pub async fn ingest(
        &self,
        session_id: &str,
        agent_id: &str,
        params: &Params,
        result: &ToolResult,
    ) -> Result<EvidenceDoc, EvidenceError> {
        let now = self.clock.now();
        let mut doc = EvidenceDoc::draft(session_id, agent_id, params.clone(), result, now)
            .with_lifecycle(self.ttl_policy.lifecycle(&result.tool_name))
            .with_provenance("cached", result.metadata.cached.to_string());
        if let Some(ms) = result.metadata.duration_ms {
            doc = doc.with_provenance("duration_ms", ms.to_string());
        }

        self.store.create(&doc).await?;
        debug!(evidence_id = %doc.id, tool = %doc.tool_name, agent = agent_id, "Evidence ingested");
        Ok(doc)
    }

    /// Sanity pass: DRAFT → VERIFIED or QUARANTINE.
    pub async fn verify(&self, id: &EvidenceId) -> Result<EvidenceDoc, EvidenceError> {
        let mut doc = self.get(id).await?;
        let ttl = self.ttl_policy.ttl_for(&doc.tool_name);
        let status = doc.verify(ttl, self.clock.now())?;
        self.store.update(&doc).await?;

        match status {
            EvidenceStatus::Quarantine => warn!(
                evidence_id = %doc.id,
                tool = %doc.tool_name,
                reason = doc.rejection_reason().unwrap_or_default(),
                "Evidence quarantined"
            ),
            _ => debug!(
                evidence_id = %doc.id,
                tool = %doc.tool_name,
                ttl_secs = ttl.as_secs(),
                "Evidence verified"
            ),
        }
        Ok(doc)
    }

    /// `ingest` followed by `verify`.
    pub async fn ingest_and_verify(
        &self,
        session_id: &str,
        agent_id: &str,
        params: &Params,
        result: &ToolResult,
    ) -> Result<EvidenceDoc, EvidenceError> {
        let doc = self.ingest(session_id, agent_id, params, result).await?;
        self.verify(&doc.id).await
    }

    pub async fn get(&self, id: &EvidenceId) -> Result<EvidenceDoc, EvidenceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| EvidenceError::NotFound(id.clone()))
    }

    /// The record if it is VERIFIED and within its TTL.
    pub async fn trusted(&self, id: &EvidenceId) -> Result<Option<EvidenceDoc>, EvidenceError> {
        let now = self.clock.now();
        Ok(self.store.get(id).await?.filter(|doc| doc.is_trusted(now)))
    }

    /// Push a trusted record's expiry out to `until` while working memory
    /// keeps reusing it. Returns whether the expiry moved.
    pub async fn renew(&self, id: &EvidenceId, until: Timestamp) -> Result<bool, EvidenceError> {
        let mut doc = self.get(id).await?;
        if !doc.renew(until, self.clock.now()) {
            return Ok(false);
        }
        self.store.update(&doc).await?;
        debug!(evidence_id = %doc.id, until = %until, "Evidence expiry renewed");
        Ok(true)
    }

    /// Move every expired VERIFIED record to STALE. Returns the ids moved.
    pub async fn check_aging(&self) -> Result<Vec<EvidenceId>, EvidenceError> {
        let now = self.clock.now();
        let mut staled = Vec::new();
        for mut doc in self.store.query_by_status(EvidenceStatus::Verified).await? {
            if doc.age(now)? {
                self.store.update(&doc).await?;
                staled.push(doc.id);
            }
        }
        if !staled.is_empty() {
            info!(count = staled.len(), "Evidence aged to STALE");
        }
        Ok(staled)
    }

    pub async fn archive(&self, id: &EvidenceId, reason: &str) -> Result<EvidenceDoc, EvidenceError> {
        let mut doc = self.get(id).await?;
        doc.archive(reason, self.clock.now())?;
        self.store.update(&doc).await?;
        debug!(evidence_id = %doc.id, reason, "Evidence archived");
        Ok(doc)
    }

    /// Archive STALE and QUARANTINE records untouched for longer than
    /// `retention`. Returns the number archived.
    pub async fn archive_expired(&self, retention: Duration) -> Result<usize, EvidenceError> {
        let now = self.clock.now();
        let mut archived = 0;
        for status in [EvidenceStatus::Stale, EvidenceStatus::Quarantine] {
            for mut doc in self.store.query_by_status(status).await? {
                if elapsed(doc.updated_at, now) < retention {
                    continue;
                }
                doc.archive(format!("{} beyond retention", status), now)?;
                self.store.update(&doc).await?;
                archived += 1;
            }
        }
        if archived > 0 {
            info!(count = archived, "Archived expired evidence");
        }
        Ok(archived)
    }

    /// A statement citing this evidence passed audit.
    pub async fn confirm(&self, id: &EvidenceId) -> Result<EvidenceDoc, EvidenceError> {
        let mut doc = self.get(id).await?;
        doc.confirm(self.clock.now());
        self.store.update(&doc).await?;
        Ok(doc)
    }

    /// The chairman disputed this evidence.
    pub async fn dispute(&self, id: &EvidenceId, reason: &str) -> Result<EvidenceDoc, EvidenceError> {
        let mut doc = self.get(id).await?;
        doc.dispute(reason, self.clock.now());
        self.store.update(&doc).await?;
        warn!(evidence_id = %doc.id, trust = doc.trust_score, reason, "Evidence disputed");
        Ok(doc)
    }
}
