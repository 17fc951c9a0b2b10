//! End-to-end pipeline tests: gateway, evidence lifecycle, hippocampal
//! memory and the debate loop wired to the in-memory adapters.

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tribunal_application::{
    Clock, DebateParams, EvidenceStore, GatewayConfig, HippocampalMemory, ManualClock,
    MemoryConfig, RunDebateInput, RunDebateUseCase, ToolExecutorPort, ToolGateway, ToolRegistry,
    evidence::EvidenceLifecycle,
};
use tribunal_domain::{
    BlockKind, CHAIRMAN_ID, CallOutcome, DebateAgent, Discipline, ErrorTier, EvidenceStatus,
    Params, SearchFilter, ToolCall, TtlPolicy,
};
use tribunal_infrastructure::{
    FixtureToolAdapter, InMemoryEvidenceStore, InMemoryFastCache, InMemorySemanticIndex,
    JsonlConversationLogger, ScriptedCompletionService, catalog,
};

const LOCK: &str = "```lock\n{\"subject\": \"Kweichow Moutai\", \"entity_code\": \"600519.SH\", \"classification\": \"baijiu\"}\n```";
const CLEAN_AUDIT: &str = "```audit\n{}\n```";

struct Stack {
    clock: Arc<ManualClock>,
    gateway: Arc<ToolGateway>,
    memory: Arc<HippocampalMemory>,
    store: Arc<InMemoryEvidenceStore>,
    index: Arc<InMemorySemanticIndex>,
    price: Arc<FixtureToolAdapter>,
}

impl Stack {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
        ));
        let cache = Arc::new(InMemoryFastCache::new(clock.clone()));
        let price = Arc::new(
            FixtureToolAdapter::new(catalog::verified_price_definition())
                .with_payload("600519.SH", json!({"data": [{"close": 1710.5}]}))
                .with_payload("000001.SZ", json!({"data": []})),
        );
        let news = Arc::new(
            FixtureToolAdapter::new(catalog::news_search_definition()).with_payload(
                "600519.SH",
                json!({"data": [{"headline": "Traceback (most recent call last): feed parser crashed"}]}),
            ),
        );
        let rates = Arc::new(
            FixtureToolAdapter::new(catalog::macro_indicator_definition()).with_default(
                tribunal_infrastructure::FixtureResponse::Payload(
                    json!({"data": [{"lpr_1y": 3.0}]}),
                ),
            ),
        );

        let registry = ToolRegistry::new()
            .register(price.clone())
            .register(news)
            .register(rates)
            .with_aliases(catalog::default_aliases());
        let gateway = Arc::new(ToolGateway::new(
            registry,
            cache.clone(),
            clock.clone(),
            GatewayConfig::default().with_guardrails(catalog::default_guardrails()),
        ));

        let store = Arc::new(InMemoryEvidenceStore::new());
        let index = Arc::new(InMemorySemanticIndex::new());
        let lifecycle = Arc::new(EvidenceLifecycle::new(
            store.clone(),
            clock.clone(),
            TtlPolicy::from_spec(gateway.tool_spec()),
        ));
        let memory = Arc::new(HippocampalMemory::new(
            lifecycle,
            cache,
            index.clone(),
            clock.clone(),
            gateway.tool_spec().clone(),
            MemoryConfig::default(),
        ));

        Self {
            clock,
            gateway,
            memory,
            store,
            index,
            price,
        }
    }

    /// Gateway call plus ingest, the way an agent turn does it.
    async fn call_and_store(&self, call: ToolCall) -> (Params, tribunal_domain::EvidenceDoc) {
        let prepared = self.gateway.prepare(&call).unwrap();
        let result = self.gateway.execute(&call).await;
        let doc = self
            .memory
            .store("s1", "quant_bull", &prepared.call.arguments, &result)
            .await
            .unwrap();
        (prepared.call.arguments, doc)
    }
}

fn price_call(entity: &str) -> ToolCall {
    ToolCall::new("verified_price").with_arg("ticker", entity)
}

#[tokio::test]
async fn test_identical_calls_within_ttl_hit_the_cache() {
    let stack = Stack::new();

    let first = stack.gateway.execute(&price_call("600519.SH")).await;
    // Alias plus a different parameter spelling normalize to the same key
    let second = stack
        .gateway
        .execute(&ToolCall::new("stock_price").with_arg("symbol", " 600519.SH "))
        .await;

    assert!(first.is_success());
    assert!(second.metadata.cached);
    assert_eq!(first.payload, second.payload);
    assert_eq!(stack.price.invocations(), 1);

    let stats = stack.gateway.stats();
    assert_eq!(stats.calls, 2);
    assert_eq!(stats.cache_hits, 1);
}

#[tokio::test]
async fn test_empty_data_is_quarantined_and_never_cached() {
    let stack = Stack::new();

    let (params, doc) = stack.call_and_store(price_call("000001.SZ")).await;

    assert_eq!(doc.status, EvidenceStatus::Quarantine);
    assert!(doc.ttl_expiry.is_none());
    assert!(
        stack
            .memory
            .retrieve_working_memory("verified_price", &params)
            .await
            .unwrap()
            .is_none()
    );
    let stored = stack.store.get(&doc.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EvidenceStatus::Quarantine);
}

#[tokio::test]
async fn test_verified_evidence_served_fresh_from_working_memory() {
    let stack = Stack::new();

    let (params, doc) = stack.call_and_store(price_call("600519.SH")).await;
    assert_eq!(doc.status, EvidenceStatus::Verified);
    assert!(doc.ttl_expiry.is_some());

    stack.clock.advance(Duration::from_secs(60));
    let hit = stack
        .memory
        .retrieve_working_memory("verified_price", &params)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.payload()["data"][0]["close"], 1710.5);
    assert!(!hit.freshness.is_stale);
    assert_eq!(hit.counters.retrieved, 1);
}

#[tokio::test]
async fn test_future_end_date_capped_and_future_start_rejected() {
    let stack = Stack::new();
    let today = stack.clock.today();
    assert_eq!(today.to_string(), "2026-03-02");

    let capped = stack
        .gateway
        .prepare(
            &price_call("600519.SH")
                .with_arg("start_date", "2026-01-05")
                .with_arg("end_date", "2026-12-31"),
        )
        .unwrap();
    assert_eq!(capped.call.arguments["end_date"], "2026-03-02");
    assert!(capped.warnings.iter().any(|w| w.contains("capped")));

    let rejected = stack
        .gateway
        .execute(&price_call("600519.SH").with_arg("start_date", "2026-06-01"))
        .await;
    let error = rejected.error.unwrap();
    assert_eq!(error.code, "FUTURE_START_DATE");
    assert_eq!(error.tier, ErrorTier::Recoverable);
    assert_eq!(stack.price.invocations(), 0);
}

#[tokio::test]
async fn test_span_beyond_provider_maximum_asks_to_narrow() {
    let stack = Stack::new();

    let result = stack
        .gateway
        .execute(
            &price_call("600519.SH")
                .with_arg("start_date", "2024-01-01")
                .with_arg("end_date", "2026-01-01"),
        )
        .await;

    let error = result.error.unwrap();
    assert_eq!(error.code, "RANGE_TOO_WIDE");
    assert_eq!(error.tier, ErrorTier::Recoverable);
    assert!(error.message.contains("narrow"));
}

#[tokio::test]
async fn test_consolidation_skips_error_like_payloads() {
    let stack = Stack::new();

    let (_, news) = stack
        .call_and_store(ToolCall::new("news_search").with_arg("query", "moutai").with_arg("entity_code", "600519.SH"))
        .await;
    let (_, price) = stack.call_and_store(price_call("600519.SH")).await;
    assert_eq!(news.status, EvidenceStatus::Verified);
    for id in [&news.id, &price.id] {
        assert!(stack.memory.mark_adopted(id).await.unwrap());
    }

    let report = stack.memory.consolidate().await.unwrap();

    assert_eq!(report.promoted, 1);
    assert_eq!(report.skipped_error_like, 1);
    assert_eq!(stack.index.count("session:s1"), 1);
}

#[tokio::test]
async fn test_macro_facts_are_shared_across_sessions() {
    let stack = Stack::new();

    let (_, rates) = stack
        .call_and_store(ToolCall::new("macro").with_arg("indicator", "lpr_1y"))
        .await;
    stack.memory.mark_adopted(&rates.id).await.unwrap();
    stack.memory.consolidate().await.unwrap();

    let hits = stack
        .memory
        .search_shared_memory("another-session", "macro_indicator lpr_1y", &SearchFilter::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.metadata.tool_name, "macro_indicator");
}

#[tokio::test]
async fn test_debate_blocks_repeated_call_and_logs_transcript() {
    let stack = Stack::new();
    let dir = tempfile::tempdir().unwrap();
    let transcript = dir.path().join("s1.jsonl");
    let logger = Arc::new(
        JsonlConversationLogger::new(&transcript)
            .unwrap()
            .with_clock(stack.clock.clone()),
    );

    let call = "```tool\n{\"tool\": \"verified_price\", \"args\": {\"ticker\": \"600519.SH\"}}\n```";
    let completion = Arc::new(
        ScriptedCompletionService::new()
            .with_replies(CHAIRMAN_ID, [LOCK])
            .with_fallback(CHAIRMAN_ID, CLEAN_AUDIT)
            .with_replies("quant_bull", [call, call])
            .with_fallback("quant_bull", "Close is 1710.5; trailing PE looks fair."),
    );
    let agent = DebateAgent::new("quant_bull", "bull")
        .with_discipline(Discipline::Quantitative)
        .with_tools(["verified_price"]);

    let output = RunDebateUseCase::new(
        completion.clone(),
        stack.gateway.clone(),
        stack.memory.clone(),
        stack.clock.clone(),
    )
    .with_categories(catalog::default_category_table())
    .with_logger(logger.clone())
    .execute(
        RunDebateInput::new("s1", "Is Moutai overvalued?", "Moutai", "600519.SH")
            .with_agent(agent)
            .with_params(DebateParams::default().with_rounds(1).with_max_steps(4)),
    )
    .await
    .unwrap();

    let turn = &output.turns[0];
    assert_eq!(turn.tool_calls.len(), 2);
    assert!(matches!(
        turn.tool_calls[1].outcome,
        CallOutcome::Blocked {
            kind: BlockKind::Loop,
            ..
        }
    ));
    assert!(turn.warnings.iter().any(|w| w.contains("LOOP WARNING")));
    assert_eq!(stack.price.invocations(), 1);
    assert_eq!(completion.served("quant_bull"), 3);

    drop(logger);
    let events: Vec<serde_json::Value> = std::fs::read_to_string(&transcript)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(types[0], "debate_started");
    assert!(types.contains(&"agent_statement"));
    assert!(types.contains(&"checkpoint"));
}
