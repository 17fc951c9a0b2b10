//! Run Debate use case
//!
//! Orchestrates a full debate session:
//!
//! ```text
//! fact lock ─▶ round 1..N ┬─▶ agent turns (concurrent, bounded)
//!                         ├─▶ pre-checks + chairman audit
//!                         ├─▶ outcome feedback (dispute / confirm / adopt)
//!                         └─▶ checkpoint
//!           ─▶ consolidation of working memory
//! ```
//!
//! If the session already has a checkpoint, the debate resumes after its
//! round with the checkpoint summary as prior context.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tribunal_domain::{
    AuditFinding, AuditReport, CategoryTable, Checkpoint, DebateAgent, DebateTranscript,
    EvidenceId, FactLock, FindingKind, SearchFilter, TranscriptEntry, TurnRecord,
    debate::extract_citations,
};

use super::agent_turn::{AgentTurnRunner, TurnContext};
use super::arbitration::Chairman;
use crate::config::DebateParams;
use crate::evidence::EvidenceError;
use crate::memory::{ConsolidationReport, EvidenceOutcome, HippocampalMemory, MemoryError};
use crate::ports::clock::Clock;
use crate::ports::completion::{CompletionError, CompletionService};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::evidence_store::StoreError;
use crate::ports::progress::{DebateProgress, NoProgress};
use crate::ports::tool_executor::ToolExecutorPort;

/// Errors that can occur during a debate
#[derive(Error, Debug)]
pub enum RunDebateError {
    #[error("No agents configured")]
    NoAgents,

    #[error("Every agent turn of round {round} failed")]
    AllTurnsFailed { round: usize },

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Debate cancelled")]
    Cancelled,
}

/// Input for the RunDebate use case
#[derive(Debug, Clone)]
pub struct RunDebateInput {
    pub session_id: String,
    pub topic: String,
    /// Declared subject, the chairman's starting point for the fact lock
    pub subject: String,
    pub entity_code: String,
    pub agents: Vec<DebateAgent>,
    pub params: DebateParams,
}

impl RunDebateInput {
    pub fn new(
        session_id: impl Into<String>,
        topic: impl Into<String>,
        subject: impl Into<String>,
        entity_code: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            topic: topic.into(),
            subject: subject.into(),
            entity_code: entity_code.into(),
            agents: Vec::new(),
            params: DebateParams::default(),
        }
    }

    pub fn with_agent(mut self, agent: DebateAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_agents(mut self, agents: impl IntoIterator<Item = DebateAgent>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn with_params(mut self, params: DebateParams) -> Self {
        self.params = params;
        self
    }
}

/// Result of a completed debate
#[derive(Debug, Clone)]
pub struct RunDebateOutput {
    pub session_id: String,
    pub fact_lock: FactLock,
    pub transcript: DebateTranscript,
    pub turns: Vec<TurnRecord>,
    pub audits: Vec<AuditReport>,
    pub last_checkpoint: Option<Checkpoint>,
    /// `None` when consolidation failed; the debate result stands
    pub consolidation: Option<ConsolidationReport>,
}

impl RunDebateOutput {
    /// Final statement of every agent in the last round, in turn order.
    pub fn final_statements(&self) -> Vec<&TurnRecord> {
        let last = self.turns.iter().map(|t| t.round).max().unwrap_or(0);
        self.turns.iter().filter(|t| t.round == last).collect()
    }
}

/// Use case for running a debate session
pub struct RunDebateUseCase {
    completion: Arc<dyn CompletionService>,
    tools: Arc<dyn ToolExecutorPort>,
    memory: Arc<HippocampalMemory>,
    clock: Arc<dyn Clock>,
    categories: Arc<CategoryTable>,
    logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl RunDebateUseCase {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        tools: Arc<dyn ToolExecutorPort>,
        memory: Arc<HippocampalMemory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            completion,
            tools,
            memory,
            clock,
            categories: Arc::new(CategoryTable::new()),
            logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = Arc::new(categories);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunDebateInput) -> Result<RunDebateOutput, RunDebateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunDebateInput,
        progress: &dyn DebateProgress,
    ) -> Result<RunDebateOutput, RunDebateError> {
        if input.agents.is_empty() {
            return Err(RunDebateError::NoAgents);
        }
        let params = &input.params;
        let agent_ids: Vec<String> = input.agents.iter().map(|a| a.id.to_string()).collect();
        info!(
            session_id = %input.session_id,
            topic = %input.topic,
            agents = agent_ids.len(),
            rounds = params.rounds,
            "Starting debate"
        );
        self.logger.log(ConversationEvent::debate_started(
            &input.session_id,
            &input.topic,
            &agent_ids,
        ));

        let lifecycle = self.memory.lifecycle();
        let resumed = lifecycle.store().latest_checkpoint(&input.session_id).await?;
        let first_round = resumed.as_ref().map(|c| c.round + 1).unwrap_or(1);
        if let Some(checkpoint) = &resumed {
            info!(session_id = %input.session_id, round = checkpoint.round, "Resuming from checkpoint");
        }

        // Phase 1: fact lock
        let chairman = Chairman::new(self.completion.clone());
        let lock = self
            .cancellable(chairman.issue_fact_lock(
                &input.topic,
                &input.subject,
                &input.entity_code,
                self.clock.now(),
            ))
            .await??;
        let mut transcript = DebateTranscript::new();
        transcript.push(TranscriptEntry::FactLock(lock.clone()));
        self.logger.log(ConversationEvent::fact_lock(&lock));

        let limiter = Arc::new(Semaphore::new(params.max_concurrency.max(1)));
        let mut runner = AgentTurnRunner::new(
            self.completion.clone(),
            self.tools.clone(),
            self.memory.clone(),
            self.categories.clone(),
            limiter,
        );
        if let Some(token) = &self.cancellation_token {
            runner = runner.with_cancellation(token.clone());
        }

        let mut turns = Vec::new();
        let mut audits = Vec::new();
        let mut last_checkpoint = resumed.clone();

        // Phase 2: rounds
        for round in first_round..=params.rounds {
            progress.on_round_start(round, params.rounds);
            info!(round, "Round started");

            let ctx = Arc::new(
                self.turn_context(&input, round, &lock, &transcript, resumed.as_ref())
                    .await,
            );
            let round_turns = self.run_round(&runner, &input.agents, ctx, progress).await?;
            if round_turns.is_empty() {
                return Err(RunDebateError::AllTurnsFailed { round });
            }

            for turn in &round_turns {
                transcript.push_turn(turn);
                self.logger.log(ConversationEvent::agent_statement(turn));
                for record in &turn.tool_calls {
                    self.logger.log(ConversationEvent::tool_call(
                        turn.agent_id.as_str(),
                        round,
                        record,
                    ));
                }
            }

            // Phase 3: arbitration
            let prechecks = self.prechecks(&round_turns, &input.agents, &lock).await?;
            let report = self
                .cancellable(chairman.audit_round(
                    round,
                    Some(&lock),
                    &transcript,
                    prechecks,
                    self.clock.now(),
                ))
                .await?;
            if let Some(correction) = &report.correction {
                info!(round, correction = %correction.text, "Chairman correction issued");
                transcript.push(TranscriptEntry::Correction(correction.clone()));
                self.logger
                    .log(ConversationEvent::correction(round, &correction.text));
            }
            self.logger.log(ConversationEvent::audit(&report));
            progress.on_audit(&report);

            self.apply_feedback(&report, &round_turns).await?;

            let checkpoint = Checkpoint::new(
                &input.session_id,
                round,
                self.checkpoint_summary(&transcript, params.recent_entries, resumed.as_ref()),
                checkpoint_evidence(&transcript, resumed.as_ref()),
                self.clock.now(),
            );
            lifecycle.store().save_checkpoint(&checkpoint).await?;
            self.logger.log(ConversationEvent::checkpoint(&checkpoint));
            debug!(round, checkpoint = %checkpoint.id, "Checkpoint saved");
            last_checkpoint = Some(checkpoint);

            audits.push(report);
            turns.extend(round_turns);
        }

        // Phase 4: consolidation
        let consolidation = match self.memory.consolidate().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Consolidation after debate failed");
                None
            }
        };

        info!(
            session_id = %input.session_id,
            turns = turns.len(),
            corrections = transcript.corrections().count(),
            "Debate complete"
        );

        Ok(RunDebateOutput {
            session_id: input.session_id,
            fact_lock: lock,
            transcript,
            turns,
            audits,
            last_checkpoint,
            consolidation,
        })
    }

    /// Run every agent's turn for one round. Turns are returned in
    /// completion order; failed turns are logged and skipped.
    async fn run_round(
        &self,
        runner: &AgentTurnRunner,
        agents: &[DebateAgent],
        ctx: Arc<TurnContext>,
        progress: &dyn DebateProgress,
    ) -> Result<Vec<TurnRecord>, RunDebateError> {
        let mut join_set = JoinSet::new();
        for agent in agents {
            let runner = runner.clone();
            let agent = agent.clone();
            let ctx = ctx.clone();
            join_set.spawn(async move {
                let result = runner.run(&agent, &ctx).await;
                (agent, result)
            });
        }

        let mut turns = Vec::new();
        loop {
            let joined = match &self.cancellation_token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.abort_all();
                        return Err(RunDebateError::Cancelled);
                    }
                    joined = join_set.join_next() => joined,
                },
                None => join_set.join_next().await,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((agent, Ok(turn))) => {
                    for record in &turn.tool_calls {
                        let tool = record.resolved.as_deref().unwrap_or(&record.requested);
                        progress.on_tool_call(&agent.id, tool, record.evidence_id().is_some());
                    }
                    progress.on_turn_complete(&agent.id, ctx.round, turn.forced);
                    debug!(agent = %agent.id, round = ctx.round, actions = turn.actions(), "Turn collected");
                    turns.push(turn);
                }
                Ok((_, Err(RunDebateError::Cancelled))) => {
                    join_set.abort_all();
                    return Err(RunDebateError::Cancelled);
                }
                Ok((agent, Err(e))) => {
                    warn!(agent = %agent.id, round = ctx.round, error = %e, "Agent turn failed");
                }
                Err(e) => {
                    warn!(round = ctx.round, error = %e, "Agent task failed");
                }
            }
        }
        Ok(turns)
    }

    async fn turn_context(
        &self,
        input: &RunDebateInput,
        round: usize,
        lock: &FactLock,
        transcript: &DebateTranscript,
        resumed: Option<&Checkpoint>,
    ) -> TurnContext {
        let mut recent = String::new();
        if let Some(checkpoint) = resumed {
            recent.push_str(&format!(
                "(Context carried over from round {})\n{}\n",
                checkpoint.round, checkpoint.summary
            ));
        }
        recent.push_str(&transcript.render_recent(input.params.recent_entries));

        let filter = SearchFilter::new().with_entity(lock.entity_code.clone());
        let memory_notes = match self
            .memory
            .search_shared_memory(&input.session_id, &input.topic, &filter)
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .take(input.params.memory_hints)
                .map(|hit| match hit.stale_warning {
                    Some(warning) => format!("{} (WARNING: {})", hit.entry.text, warning),
                    None => hit.entry.text,
                })
                .collect(),
            Err(e) => {
                warn!(round, error = %e, "Long-term memory search failed");
                Vec::new()
            }
        };

        TurnContext {
            session_id: input.session_id.clone(),
            topic: input.topic.clone(),
            round,
            lock: Some(lock.clone()),
            corrections: transcript.corrections().cloned().collect(),
            recent,
            memory_notes,
            max_steps: input.params.max_steps,
        }
    }

    /// Deterministic findings plus a check that every cited evidence id is
    /// still trusted.
    async fn prechecks(
        &self,
        turns: &[TurnRecord],
        agents: &[DebateAgent],
        lock: &FactLock,
    ) -> Result<Vec<AuditFinding>, RunDebateError> {
        let lifecycle = self.memory.lifecycle();
        let mut findings = Vec::new();
        for turn in turns {
            if let Some(agent) = agents.iter().find(|a| a.id == turn.agent_id) {
                findings.extend(tribunal_domain::precheck(turn, agent, Some(lock)));
            }
            for id in extract_citations(&turn.statement) {
                if lifecycle.trusted(&id).await?.is_none() {
                    findings.push(AuditFinding::new(
                        Some(turn.agent_id.clone()),
                        FindingKind::UnsupportedClaim,
                        format!("cites evidence {} which is not verified", id),
                    ));
                }
            }
        }
        Ok(findings)
    }

    /// Feed the audit back into evidence trust and memory importance.
    async fn apply_feedback(
        &self,
        report: &AuditReport,
        turns: &[TurnRecord],
    ) -> Result<(), RunDebateError> {
        let lifecycle = self.memory.lifecycle();
        let disputed: HashSet<&EvidenceId> = report.disputed.iter().collect();

        for id in &report.disputed {
            match lifecycle.dispute(id, "disputed by chairman").await {
                Ok(_) => {}
                Err(EvidenceError::NotFound(_)) => {
                    warn!(evidence_id = %id, "Chairman disputed unknown evidence");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            skip_unknown(self.memory.mark_outcome(id, EvidenceOutcome::Misleading).await)?;
        }

        for turn in turns {
            let adopted: Vec<EvidenceId> = adopted_evidence(turn)
                .into_iter()
                .filter(|id| !disputed.contains(id))
                .collect();
            for id in &adopted {
                skip_unknown(self.memory.mark_adopted(id).await)?;
            }
            if !report.passed(&turn.agent_id) {
                continue;
            }
            for id in &adopted {
                match lifecycle.confirm(id).await {
                    Ok(_) => {}
                    Err(EvidenceError::NotFound(_)) => continue,
                    Err(e) => return Err(e.into()),
                }
                skip_unknown(self.memory.mark_outcome(id, EvidenceOutcome::Success).await)?;
            }
        }
        Ok(())
    }

    fn checkpoint_summary(
        &self,
        transcript: &DebateTranscript,
        recent_entries: usize,
        resumed: Option<&Checkpoint>,
    ) -> String {
        let recent = transcript.render_recent(recent_entries);
        match resumed {
            Some(checkpoint) if !checkpoint.summary.is_empty() => {
                format!("{}\n{}", checkpoint.summary, recent)
            }
            _ => recent,
        }
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> Result<T, RunDebateError> {
        match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(RunDebateError::Cancelled),
                value = fut => Ok(value),
            },
            None => Ok(fut.await),
        }
    }
}

/// Evidence the agent built on: cited ids, or every usable observation
/// when the statement cites nothing.
fn adopted_evidence(turn: &TurnRecord) -> Vec<EvidenceId> {
    if turn.statement.trim().is_empty() {
        return Vec::new();
    }
    let cited = extract_citations(&turn.statement);
    if cited.is_empty() {
        turn.evidence_ids()
    } else {
        cited
    }
}

fn checkpoint_evidence(transcript: &DebateTranscript, resumed: Option<&Checkpoint>) -> Vec<EvidenceId> {
    let mut ids: Vec<EvidenceId> = resumed.map(|c| c.evidence_ids.clone()).unwrap_or_default();
    for id in transcript.cited_evidence() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Unknown evidence ids (hallucinated citations) are not an error.
fn skip_unknown(result: Result<bool, MemoryError>) -> Result<(), RunDebateError> {
    match result {
        Ok(_) => Ok(()),
        Err(MemoryError::Evidence(EvidenceError::NotFound(id))) => {
            debug!(evidence_id = %id, "Feedback for unknown evidence ignored");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
