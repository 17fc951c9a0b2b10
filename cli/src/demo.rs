//! `tribunal demo`: run a scripted debate against fixture tools.
//!
//! A scenario file bundles everything a debate needs except a model
//! backend: the agents, fixture tool responses and per-agent completion
//! scripts. The wiring below is the same one a production binary uses,
//! with the fixtures and the scripted completion service swapped in.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tribunal_application::{
    Clock, DebateProgress, EvidenceLifecycle, GatewayStatsSnapshot, HippocampalMemory,
    ManualClock, NoProgress, RunDebateInput, RunDebateOutput, RunDebateUseCase, SystemClock,
    ToolExecutorPort, ToolGateway, ToolRegistry, TribunalConfig, spawn_consolidation_loop,
};
use tribunal_domain::{DebateAgent, GuardrailPolicies, Timestamp, TtlPolicy};
use tribunal_infrastructure::{
    AgentScript, FixtureSpec, FixtureToolAdapter, InMemoryEvidenceStore, InMemoryFastCache,
    InMemorySemanticIndex, JsonlConversationLogger, ScriptedCompletionService, catalog,
};

/// A demo scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub session_id: String,
    pub topic: String,
    pub subject: String,
    pub entity_code: String,
    /// Fixed start time; wall-clock time when absent
    #[serde(default)]
    pub start_at: Option<Timestamp>,
    #[serde(default)]
    pub rounds: Option<usize>,
    pub agents: Vec<DebateAgent>,
    #[serde(default)]
    pub fixtures: Vec<FixtureSpec>,
    #[serde(default)]
    pub scripts: HashMap<String, AgentScript>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }
}

/// Options the command line adds on top of the scenario.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub rounds: Option<usize>,
    pub transcript: Option<PathBuf>,
}

pub struct DemoRun {
    pub output: RunDebateOutput,
    pub stats: GatewayStatsSnapshot,
}

/// Fill in catalog guardrails for families the configuration leaves open.
fn with_catalog_guardrails(configured: GuardrailPolicies) -> GuardrailPolicies {
    let defaults = catalog::default_guardrails();
    ["exchange", "newswire", "macro"]
        .into_iter()
        .fold(configured, |policies, family| {
            match (policies.get(family), defaults.get(family)) {
                (None, Some(policy)) => {
                    let policy = policy.clone();
                    policies.with_policy(family, policy)
                }
                _ => policies,
            }
        })
}

pub async fn run(
    scenario: Scenario,
    mut config: TribunalConfig,
    options: DemoOptions,
    progress: &dyn DebateProgress,
) -> Result<DemoRun> {
    let clock: Arc<dyn Clock> = match scenario.start_at {
        Some(start) => Arc::new(ManualClock::new(start)),
        None => Arc::new(SystemClock),
    };

    // === Dependency Injection ===
    let mut registry = ToolRegistry::new();
    for spec in scenario.fixtures {
        let adapter = FixtureToolAdapter::from_spec(spec, catalog::definition)
            .map_err(anyhow::Error::msg)?;
        registry = registry.register(Arc::new(adapter));
    }
    let registry = registry.with_aliases(catalog::default_aliases());

    config.gateway.guardrails = with_catalog_guardrails(std::mem::take(&mut config.gateway.guardrails));
    let cache = Arc::new(InMemoryFastCache::new(clock.clone()));
    let gateway = Arc::new(ToolGateway::new(
        registry,
        cache.clone(),
        clock.clone(),
        config.gateway.clone(),
    ));

    let store = Arc::new(InMemoryEvidenceStore::new());
    let lifecycle = Arc::new(EvidenceLifecycle::new(
        store,
        clock.clone(),
        gateway.ttl_policy().clone(),
    ));
    let memory = Arc::new(HippocampalMemory::new(
        lifecycle,
        cache,
        Arc::new(InMemorySemanticIndex::new()),
        clock.clone(),
        gateway.tool_spec().clone(),
        config.memory.clone(),
    ));

    let completion = Arc::new(ScriptedCompletionService::from_scripts(scenario.scripts));
    let token = CancellationToken::new();
    let mut use_case = RunDebateUseCase::new(completion, gateway.clone(), memory.clone(), clock.clone())
        .with_categories(catalog::default_category_table())
        .with_cancellation(token.clone());
    if let Some(path) = &options.transcript {
        match JsonlConversationLogger::new(path) {
            Some(logger) => {
                info!(path = %path.display(), "Writing debate transcript");
                use_case = use_case.with_logger(Arc::new(logger.with_clock(clock.clone())));
            }
            None => warn!(path = %path.display(), "Transcript disabled"),
        }
    }

    let consolidation = spawn_consolidation_loop(
        memory.clone(),
        config.memory.consolidation_interval(),
        token.child_token(),
    );
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling debate");
                token.cancel();
            }
        })
    };

    let mut params = config.debate.clone();
    if let Some(rounds) = options.rounds.or(scenario.rounds) {
        params = params.with_rounds(rounds);
    }
    let input = RunDebateInput::new(
        scenario.session_id,
        scenario.topic,
        scenario.subject,
        scenario.entity_code,
    )
    .with_agents(scenario.agents)
    .with_params(params);

    let result = use_case.execute_with_progress(input, progress).await;

    token.cancel();
    interrupt.abort();
    if let Err(e) = consolidation.await {
        warn!(error = %e, "Consolidation loop ended abnormally");
    }

    let output = result.context("Debate failed")?;
    Ok(DemoRun {
        output,
        stats: gateway.stats(),
    })
}

/// Run without progress output.
pub async fn run_quiet(scenario: Scenario, config: TribunalConfig, options: DemoOptions) -> Result<DemoRun> {
    run(scenario, config, options, &NoProgress).await
}

/// TTLs of the catalog tools, for `tribunal config`.
pub fn catalog_ttls() -> Vec<(String, u64)> {
    let spec = catalog::financial_definitions()
        .into_iter()
        .fold(tribunal_domain::ToolSpec::new(), |spec, def| spec.register(def));
    let policy = TtlPolicy::from_spec(&spec);
    spec.names()
        .map(|name| (name.to_string(), policy.ttl_for(name).as_secs()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribunal_domain::{BlockKind, CallOutcome};

    const BASIC: &str = include_str!("../../demos/basic_debate.json");

    fn scenario() -> Scenario {
        serde_json::from_str(BASIC).unwrap()
    }

    #[test]
    fn test_basic_scenario_parses() {
        let scenario = scenario();
        assert_eq!(scenario.entity_code, "600519.SH");
        assert_eq!(scenario.agents.len(), 3);
        assert!(scenario.start_at.is_some());
        assert!(scenario.scripts.contains_key("chairman"));
    }

    #[tokio::test]
    async fn test_basic_scenario_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("demo.jsonl");
        let run = run_quiet(
            scenario(),
            TribunalConfig::default(),
            DemoOptions {
                rounds: None,
                transcript: Some(transcript.clone()),
            },
        )
        .await
        .unwrap();

        let output = &run.output;
        assert_eq!(output.fact_lock.entity_code, "600519.SH");
        assert_eq!(output.audits.len(), 2);
        assert_eq!(output.transcript.corrections().count(), 1);

        let bull_calls: Vec<_> = output
            .turns
            .iter()
            .filter(|t| t.agent_id.as_str() == "quant_bull")
            .flat_map(|t| t.tool_calls.iter())
            .collect();
        assert!(bull_calls.iter().any(|c| matches!(
            c.outcome,
            CallOutcome::Blocked {
                kind: BlockKind::Loop,
                ..
            }
        )));
        assert!(bull_calls.iter().any(|c| matches!(
            c.outcome,
            CallOutcome::Observed {
                from_memory: true,
                ..
            }
        )));
        assert!(run.stats.adapter_calls >= 2);
        assert!(std::fs::read_to_string(&transcript).unwrap().contains("\"fact_lock\""));
    }

    #[test]
    fn test_configured_guardrails_win_over_catalog() {
        let configured = GuardrailPolicies::new().with_policy(
            "exchange",
            tribunal_domain::ProviderPolicy::default().with_max_span_days(30),
        );
        let merged = with_catalog_guardrails(configured);
        assert_eq!(merged.get("exchange").unwrap().max_span_days, Some(30));
        assert!(merged.get("newswire").is_some());
    }

    #[test]
    fn test_catalog_ttls_cover_catalog() {
        let ttls = catalog_ttls();
        assert_eq!(ttls.len(), catalog::financial_definitions().len());
        assert!(ttls.iter().all(|(_, secs)| *secs > 0));
    }
}
