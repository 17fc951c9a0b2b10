//! Chairman: fact anchoring before round one and the per-round audit.
//!
//! Both steps degrade instead of aborting the debate. An unparseable lock
//! falls back to the declared subject, and an unparseable or failed audit
//! falls back to the deterministic pre-checks.

use std::sync::Arc;
use tracing::{debug, info, warn};

use tribunal_domain::{
    AuditFinding, AuditReport, ChairmanPromptTemplate, ChairmanVerdict, Conversation,
    DebateTranscript, FactLock, Timestamp,
};

use crate::ports::completion::{CompletionError, CompletionService};

pub struct Chairman {
    completion: Arc<dyn CompletionService>,
}

impl Chairman {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Ask the chairman to lock the subject, entity code and classification.
    pub async fn issue_fact_lock(
        &self,
        topic: &str,
        subject: &str,
        entity_code: &str,
        now: Timestamp,
    ) -> Result<FactLock, CompletionError> {
        let mut conversation = Conversation::with_system_prompt(ChairmanPromptTemplate::system());
        conversation.add_user(ChairmanPromptTemplate::lock_prompt(topic, subject, entity_code));

        let completion = self.completion.complete(conversation.messages(), &[]).await?;
        match FactLock::parse(&completion.text, now) {
            Ok(lock) => {
                info!(subject = %lock.subject, entity_code = %lock.entity_code, "Fact lock issued");
                Ok(lock)
            }
            Err(error) => {
                warn!(error = %error, "Unparseable fact lock, falling back to declared subject");
                Ok(FactLock::new(subject, entity_code, "", now))
            }
        }
    }

    /// Audit one round. `prechecks` are always part of the report.
    pub async fn audit_round(
        &self,
        round: usize,
        lock: Option<&FactLock>,
        transcript: &DebateTranscript,
        prechecks: Vec<AuditFinding>,
        now: Timestamp,
    ) -> AuditReport {
        let summaries = transcript.team_summaries(round);
        let mut conversation = Conversation::with_system_prompt(ChairmanPromptTemplate::system());
        conversation.add_user(ChairmanPromptTemplate::audit_prompt(
            round, lock, &summaries, &prechecks,
        ));

        let report = AuditReport::new(round, prechecks);
        let completion = match self.completion.complete(conversation.messages(), &[]).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(round, error = %e, "Chairman audit failed, keeping automatic findings");
                return report;
            }
        };

        match ChairmanVerdict::parse(&completion.text) {
            Ok(verdict) => {
                debug!(
                    round,
                    findings = verdict.findings.len(),
                    disputed = verdict.disputed_evidence.len(),
                    correction = verdict.correction.is_some(),
                    "Chairman verdict"
                );
                report.with_verdict(verdict, now)
            }
            Err(error) => {
                warn!(round, error = %error, "Unparseable chairman audit, keeping automatic findings");
                report
            }
        }
    }
}
