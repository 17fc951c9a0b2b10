//! Application layer for tribunal
//!
//! This crate contains the services, use cases, port definitions and
//! application configuration. It depends only on the domain layer.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`gateway`] | the single door to data providers: normalize, guard, cache, rate limit |
//! | [`evidence`] | persist and verify every tool result |
//! | [`memory`] | working memory, importance scoring, consolidation to long-term memory |
//! | [`use_cases`] | the debate loop and chairman arbitration |

pub mod config;
pub mod evidence;
pub mod gateway;
pub mod memory;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{DebateParams, GatewayConfig, MemoryConfig, RateLimit, TribunalConfig};
pub use evidence::{EvidenceError, EvidenceLifecycle};
pub use gateway::{GatewayStatsSnapshot, ToolGateway, ToolRegistry};
pub use memory::{
    ConsolidationReport, EvidenceOutcome, HippocampalMemory, MemoryError, spawn_consolidation_loop,
};
pub use ports::{
    clock::{Clock, ManualClock, SystemClock},
    completion::{Completion, CompletionError, CompletionService},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    evidence_store::{EvidenceStore, StoreError},
    fast_cache::{CacheError, FastCache},
    progress::{DebateProgress, NoProgress},
    semantic_index::{IndexError, SemanticIndex},
    tool_executor::{PreparedCall, ToolExecutorPort},
};
pub use use_cases::run_debate::{
    RunDebateError, RunDebateInput, RunDebateOutput, RunDebateUseCase,
};
