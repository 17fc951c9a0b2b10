//! One agent turn: THINK → (ACT → OBSERVE)* → SPEAK.
//!
//! The turn is strictly sequential and bounded by `max_steps` completion
//! calls. Every ACT step runs the same checks in order:
//!
//! ```text
//! requested tool ─▶ equipment ─▶ prepare (normalize, guardrails, validate)
//!   ─▶ fact lock ─▶ loop guard ─▶ working memory ─▶ gateway ─▶ memory.store
//! ```
//!
//! A blocked or failed call never ends the turn: it becomes an explicit
//! observation the agent must react to. When the budget runs out the agent
//! is asked for a final statement without tools.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tribunal_domain::{
    AgentAction, BlockKind, CallOutcome, CategoryTable, Conversation, Correction, DebateAgent,
    DebatePromptTemplate, EquipmentResolver, Equipped, EvidenceStatus, FactLock, LoopCheck,
    LoopGuard, ToolCall, ToolCallRecord, ToolDefinition, TurnPhase, TurnRecord,
    parse_agent_output,
};

use super::run_debate::RunDebateError;
use crate::memory::HippocampalMemory;
use crate::ports::completion::{Completion, CompletionService};
use crate::ports::tool_executor::ToolExecutorPort;

/// Statement used when a forced final answer contains nothing usable.
const NO_CONCLUSION: &str =
    "No conclusion could be reached within the step limit; the available evidence was insufficient.";

/// Round-wide inputs shared by every turn of the round.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    pub topic: String,
    pub round: usize,
    pub lock: Option<FactLock>,
    pub corrections: Vec<Correction>,
    /// Rendered recent transcript
    pub recent: String,
    /// Related long-term memory, one line each
    pub memory_notes: Vec<String>,
    pub max_steps: usize,
}

/// Executes agent turns. Cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct AgentTurnRunner {
    completion: Arc<dyn CompletionService>,
    tools: Arc<dyn ToolExecutorPort>,
    memory: Arc<HippocampalMemory>,
    categories: Arc<CategoryTable>,
    limiter: Arc<Semaphore>,
    cancellation_token: Option<CancellationToken>,
}

impl AgentTurnRunner {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        tools: Arc<dyn ToolExecutorPort>,
        memory: Arc<HippocampalMemory>,
        categories: Arc<CategoryTable>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            completion,
            tools,
            memory,
            categories,
            limiter,
            cancellation_token: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn run(
        &self,
        agent: &DebateAgent,
        ctx: &TurnContext,
    ) -> Result<TurnRecord, RunDebateError> {
        let spec = self.tools.tool_spec();
        let equipped: Vec<&ToolDefinition> = spec.subset(&agent.tools).collect();
        let corrections: Vec<&Correction> = ctx.corrections.iter().collect();
        let tool_defs: Vec<ToolDefinition> = equipped.iter().map(|d| (*d).clone()).collect();

        let mut conversation = Conversation::with_system_prompt(DebatePromptTemplate::agent_system(
            agent,
            &equipped,
            ctx.lock.as_ref(),
            &corrections,
        ));
        conversation.add_user(DebatePromptTemplate::turn_prompt(
            &ctx.topic,
            ctx.round,
            &ctx.recent,
            &ctx.memory_notes,
        ));

        let mut turn = TurnRecord::new(agent.id.clone(), agent.team.clone(), ctx.round);
        let mut guard = LoopGuard::new();

        for step in 1..=ctx.max_steps {
            let completion = self.complete(&conversation, &tool_defs).await?;
            turn.push_step(TurnPhase::Think, completion.text.clone());
            conversation.add_assistant(completion.text.clone());

            let action = match completion.tool_intent {
                Some(intent) => AgentAction::CallTool(intent.into_call()),
                None => parse_agent_output(&completion.text),
            };

            match action {
                AgentAction::Speak(text) => {
                    turn.push_step(TurnPhase::Speak, text.clone());
                    turn.statement = text;
                    debug!(agent = %agent.id, round = ctx.round, steps = step, "Turn complete");
                    return Ok(turn);
                }
                AgentAction::Malformed { error, .. } => {
                    warn!(agent = %agent.id, error = %error, "Unparseable tool block");
                    let note = DebatePromptTemplate::format_note(&error);
                    turn.warnings.push(note.clone());
                    conversation.add_user(note);
                }
                AgentAction::CallTool(call) => {
                    let observation = self.act(agent, ctx, call, &mut guard, &mut turn).await?;
                    turn.push_step(TurnPhase::Observe, observation.clone());
                    conversation.add_user(observation);
                }
            }
        }

        warn!(agent = %agent.id, round = ctx.round, max_steps = ctx.max_steps, "Step budget exhausted, forcing final statement");
        turn.forced = true;
        conversation.add_user(DebatePromptTemplate::force_final());
        let completion = self.complete(&conversation, &[]).await?;
        turn.push_step(TurnPhase::Think, completion.text.clone());

        let statement = match parse_agent_output(&completion.text) {
            AgentAction::Speak(text) if !text.is_empty() => text,
            _ => {
                let prose = strip_fences(&completion.text);
                if prose.is_empty() {
                    NO_CONCLUSION.to_string()
                } else {
                    prose
                }
            }
        };
        turn.push_step(TurnPhase::Speak, statement.clone());
        turn.statement = statement;
        Ok(turn)
    }

    /// ACT + OBSERVE for one requested call. Returns the observation text.
    async fn act(
        &self,
        agent: &DebateAgent,
        ctx: &TurnContext,
        call: ToolCall,
        guard: &mut LoopGuard,
        turn: &mut TurnRecord,
    ) -> Result<String, RunDebateError> {
        let requested = call.tool_name.clone();
        turn.push_step(
            TurnPhase::Act,
            format!(
                "{} {}",
                requested,
                serde_json::Value::Object(call.arguments.clone())
            ),
        );

        let record = |resolved: Option<String>, params, outcome| ToolCallRecord {
            requested: requested.clone(),
            resolved,
            params,
            outcome,
        };

        let spec = self.tools.tool_spec();
        let mut notes = Vec::new();
        let tool = match EquipmentResolver::new(spec, &self.categories).resolve(agent, &requested) {
            Equipped::Direct(name) => name,
            Equipped::Redirected { to, .. } => {
                debug!(agent = %agent.id, requested = %requested, to = %to, "Redirected tool request");
                notes.push(format!("'{}' is not equipped; used '{}' instead", requested, to));
                to
            }
            Equipped::Unavailable { reason, .. } => {
                turn.tool_calls.push(record(
                    None,
                    call.arguments.clone(),
                    CallOutcome::Blocked {
                        kind: BlockKind::NotEquipped,
                        reason: reason.clone(),
                    },
                ));
                return Ok(DebatePromptTemplate::blocked_observation(&reason));
            }
        };

        let call = ToolCall {
            tool_name: tool.clone(),
            ..call
        };
        let prepared = match self.tools.prepare(&call) {
            Ok(prepared) => prepared,
            Err(error) => {
                debug!(agent = %agent.id, tool = %tool, code = %error.code, "Tool call rejected");
                turn.tool_calls.push(record(
                    Some(tool.clone()),
                    call.arguments.clone(),
                    CallOutcome::Failed {
                        tier: error.tier,
                        code: error.code.clone(),
                        message: error.message.clone(),
                    },
                ));
                return Ok(DebatePromptTemplate::failure_observation(&tool, &error));
            }
        };
        notes.extend(prepared.warnings.iter().cloned());
        let params = prepared.call.arguments.clone();

        if let Some(lock) = &ctx.lock
            && let Some(violation) = lock.check_params(&params)
        {
            warn!(agent = %agent.id, tool = %tool, "Tool call blocked by fact lock");
            turn.tool_calls.push(record(
                Some(tool.clone()),
                params,
                CallOutcome::Blocked {
                    kind: BlockKind::FactLock,
                    reason: violation.clone(),
                },
            ));
            return Ok(DebatePromptTemplate::blocked_observation(&violation));
        }

        if let LoopCheck::Repeated { warning } = guard.check(&tool, &params) {
            warn!(agent = %agent.id, tool = %tool, "Repeated tool call blocked");
            turn.warnings.push(warning.clone());
            turn.tool_calls.push(record(
                Some(tool.clone()),
                params,
                CallOutcome::Blocked {
                    kind: BlockKind::Loop,
                    reason: "identical call already made this turn".to_string(),
                },
            ));
            return Ok(warning);
        }

        match self.memory.retrieve_working_memory(&tool, &params).await {
            Ok(Some(hit)) => {
                turn.tool_calls.push(record(
                    Some(tool.clone()),
                    params,
                    CallOutcome::Observed {
                        evidence_id: hit.item.evidence_id.clone(),
                        from_memory: true,
                        empty: false,
                    },
                ));
                return Ok(DebatePromptTemplate::observation(
                    &tool,
                    &hit.item.evidence_id,
                    hit.payload(),
                    Some(&hit.freshness),
                    &notes,
                ));
            }
            Ok(None) => {}
            Err(e) => warn!(tool = %tool, error = %e, "Working memory lookup failed, calling gateway"),
        }

        let result = self.tools.execute(&prepared.call).await;
        let doc = self
            .memory
            .store(&ctx.session_id, agent.id.as_str(), &params, &result)
            .await?;

        if let Some(error) = result.error() {
            turn.tool_calls.push(record(
                Some(tool.clone()),
                params,
                CallOutcome::Failed {
                    tier: error.tier,
                    code: error.code.clone(),
                    message: error.message.clone(),
                },
            ));
            return Ok(DebatePromptTemplate::failure_observation(&tool, error));
        }

        if doc.status != EvidenceStatus::Verified {
            let warning = DebatePromptTemplate::empty_data_warning(&tool);
            turn.warnings.push(warning.clone());
            turn.tool_calls.push(record(
                Some(tool.clone()),
                params,
                CallOutcome::Observed {
                    evidence_id: doc.id.clone(),
                    from_memory: false,
                    empty: true,
                },
            ));
            return Ok(warning);
        }

        notes.extend(result.metadata.warnings.iter().cloned());
        turn.tool_calls.push(record(
            Some(tool.clone()),
            params,
            CallOutcome::Observed {
                evidence_id: doc.id.clone(),
                from_memory: false,
                empty: false,
            },
        ));
        let payload = result.payload().cloned().unwrap_or_default();
        Ok(DebatePromptTemplate::observation(&tool, &doc.id, &payload, None, &dedup(notes)))
    }

    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Completion, RunDebateError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| RunDebateError::Cancelled)?;
        let request = self.completion.complete(conversation.messages(), tools);

        let completion = match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RunDebateError::Cancelled),
                completion = request => completion?,
            },
            None => request.await?,
        };
        Ok(completion)
    }
}

/// Text outside any fenced block.
fn strip_fences(text: &str) -> String {
    let mut in_block = false;
    let mut kept = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_block = !in_block;
            continue;
        }
        if !in_block {
            kept.push(line);
        }
    }
    kept.join("\n").trim().to_string()
}

fn dedup(mut notes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    notes.retain(|n| seen.insert(n.clone()));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, MemoryConfig};
    use crate::evidence::EvidenceLifecycle;
    use crate::gateway::{ToolGateway, ToolRegistry};
    use crate::ports::clock::ManualClock;
    use crate::testing::{CountingAdapter, KeywordIndex, MapCache, MemoryStore, ScriptedCompletion, fixed_now};
    use chrono::Utc;
    use serde_json::json;
    use tribunal_domain::{
        Discipline, ToolCategory, ToolIntent, ToolParameter, TtlPolicy, ToolDefinition,
    };

    struct Harness {
        runner: AgentTurnRunner,
        completion: Arc<ScriptedCompletion>,
        price: Arc<CountingAdapter>,
        news: Arc<CountingAdapter>,
    }

    fn price_def() -> ToolDefinition {
        ToolDefinition::new("verified_price", "Verified closing prices")
            .with_family("exchange")
            .with_category(ToolCategory::Price)
            .with_parameter(ToolParameter::new("entity_code", "Entity code", true))
    }

    fn news_def() -> ToolDefinition {
        ToolDefinition::new("news_search", "News headlines")
            .with_family("news")
            .with_category(ToolCategory::News)
            .with_parameter(ToolParameter::new("entity_code", "Entity code", true))
    }

    fn harness(completion: ScriptedCompletion, news_payload: serde_json::Value) -> Harness {
        let clock = Arc::new(ManualClock::new(fixed_now()));
        let cache = Arc::new(MapCache::new(clock.clone()));
        let price = Arc::new(CountingAdapter::new(price_def(), json!({"data": [{"close": 1710.5}]})));
        let news = Arc::new(CountingAdapter::new(news_def(), news_payload));
        let registry = ToolRegistry::new()
            .register(price.clone())
            .register(news.clone())
            .with_alias("generic_quote", "verified_price");
        let gateway = Arc::new(ToolGateway::new(registry, cache.clone(), clock.clone(), GatewayConfig::default()));
        let lifecycle = Arc::new(EvidenceLifecycle::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            TtlPolicy::from_spec(gateway.tool_spec()),
        ));
        let memory = Arc::new(HippocampalMemory::new(
            lifecycle,
            cache,
            Arc::new(KeywordIndex::new()),
            clock,
            gateway.tool_spec().clone(),
            MemoryConfig::default(),
        ));
        let completion = Arc::new(completion);
        let runner = AgentTurnRunner::new(
            completion.clone(),
            gateway,
            memory,
            Arc::new(CategoryTable::new()),
            Arc::new(Semaphore::new(2)),
        );
        Harness {
            runner,
            completion,
            price,
            news,
        }
    }

    fn agent() -> DebateAgent {
        DebateAgent::new("quant_bull", "bull")
            .with_discipline(Discipline::Quantitative)
            .with_tools(["verified_price", "news_search"])
    }

    fn ctx(lock: Option<FactLock>, max_steps: usize) -> TurnContext {
        TurnContext {
            session_id: "s1".into(),
            topic: "Is Moutai overvalued?".into(),
            round: 1,
            lock,
            corrections: Vec::new(),
            recent: String::new(),
            memory_notes: Vec::new(),
            max_steps,
        }
    }

    fn tool_block(tool: &str, entity: &str) -> String {
        format!(
            "Let me check.\n```tool\n{{\"tool\": \"{}\", \"args\": {{\"entity_code\": \"{}\"}}}}\n```",
            tool, entity
        )
    }

    fn last_user(messages: &[tribunal_domain::Message]) -> String {
        messages.last().map(|m| m.content.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_observe_then_speak() {
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [tool_block("verified_price", "600519.SH"), "Closed at 1710.5.".to_string()],
            ),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 4)).await.unwrap();

        assert_eq!(turn.statement, "Closed at 1710.5.");
        assert!(!turn.forced);
        assert_eq!(turn.evidence_ids().len(), 1);
        assert_eq!(h.price.calls(), 1);

        let requests = h.completion.requests_for("quant_bull");
        let observation = last_user(&requests[1]);
        assert!(observation.contains("OBSERVATION from verified_price [evidence:"));
    }

    #[tokio::test]
    async fn test_repeated_call_is_blocked_with_warning() {
        let block = tool_block("verified_price", "600519.SH");
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [block.clone(), block, "Done.".to_string()],
            ),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 5)).await.unwrap();

        assert_eq!(h.price.calls(), 1);
        assert_eq!(turn.blocked_by(BlockKind::Loop).count(), 1);
        let requests = h.completion.requests_for("quant_bull");
        assert!(last_user(&requests[2]).contains("LOOP WARNING"));
    }

    #[tokio::test]
    async fn test_empty_result_injects_honesty_warning() {
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [tool_block("news_search", "600519.SH"), "No news available.".to_string()],
            ),
            json!({"data": []}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 4)).await.unwrap();

        assert!(turn.evidence_ids().is_empty());
        assert!(matches!(
            turn.tool_calls[0].outcome,
            CallOutcome::Observed { empty: true, .. }
        ));
        let requests = h.completion.requests_for("quant_bull");
        assert!(last_user(&requests[1]).contains("DATA HONESTY WARNING"));
        assert_eq!(h.news.calls(), 1);
    }

    #[tokio::test]
    async fn test_fact_lock_blocks_foreign_entity() {
        let lock = FactLock::new("Kweichow Moutai", "600519.SH", "baijiu", Utc::now());
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [tool_block("verified_price", "000858.SZ"), "Stopping.".to_string()],
            ),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(Some(lock), 4)).await.unwrap();

        assert_eq!(h.price.calls(), 0);
        assert_eq!(turn.blocked_by(BlockKind::FactLock).count(), 1);
        let requests = h.completion.requests_for("quant_bull");
        assert!(last_user(&requests[1]).contains("CALL BLOCKED"));
    }

    #[tokio::test]
    async fn test_unequipped_price_request_is_redirected() {
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [tool_block("exchange_daily_quote", "600519.SH"), "Done.".to_string()],
            ),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 4)).await.unwrap();

        assert_eq!(h.price.calls(), 1);
        assert_eq!(turn.tool_calls[0].resolved.as_deref(), Some("verified_price"));
    }

    #[tokio::test]
    async fn test_working_memory_serves_second_turn() {
        let h = harness(
            ScriptedCompletion::new().script(
                "quant_bull",
                [
                    tool_block("verified_price", "600519.SH"),
                    "First.".to_string(),
                    tool_block("verified_price", "600519.SH"),
                    "Second.".to_string(),
                ],
            ),
            json!({"data": [1]}),
        );
        h.runner.run(&agent(), &ctx(None, 4)).await.unwrap();
        let second = h.runner.run(&agent(), &ctx(None, 4)).await.unwrap();

        assert_eq!(h.price.calls(), 1);
        assert!(matches!(
            second.tool_calls[0].outcome,
            CallOutcome::Observed { from_memory: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_step_budget_forces_final_statement() {
        let h = harness(
            ScriptedCompletion::new()
                .script(
                    "quant_bull",
                    [
                        tool_block("verified_price", "600519.SH"),
                        "```tool\nnot json\n```".to_string(),
                    ],
                )
                .with_fallback("quant_bull", "Final: price verified at 1710.5."),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 2)).await.unwrap();

        assert!(turn.forced);
        assert_eq!(turn.statement, "Final: price verified at 1710.5.");
        assert!(turn.warnings.iter().any(|w| w.contains("FORMAT ERROR")));
        let requests = h.completion.requests_for("quant_bull");
        assert!(last_user(&requests[2]).contains("STEP LIMIT REACHED"));
    }

    #[tokio::test]
    async fn test_structured_intent_takes_priority() {
        let mut args = tribunal_domain::Params::new();
        args.insert("symbol".into(), json!("600519.SH"));
        let intent = ToolIntent {
            tool: "generic_quote".into(),
            args,
            reasoning: None,
        };
        let h = harness(
            ScriptedCompletion::new()
                .script_completions("quant_bull", [Completion::text("").with_tool_intent(intent)])
                .with_fallback("quant_bull", "Done."),
            json!({"data": [1]}),
        );
        let turn = h.runner.run(&agent(), &ctx(None, 3)).await.unwrap();
        assert_eq!(h.price.calls(), 1);
        assert_eq!(turn.tool_calls[0].params["entity_code"], json!("600519.SH"));
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("Final.\n```tool\n{}\n```\n"), "Final.");
        assert_eq!(strip_fences("```tool\n{}\n```"), "");
    }
}
