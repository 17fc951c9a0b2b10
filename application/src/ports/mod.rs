//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//!
//! | Port | Consumed by |
//! |------|-------------|
//! | [`fast_cache::FastCache`] | gateway cache, rate limiter, working memory |
//! | [`semantic_index::SemanticIndex`] | long-term memory |
//! | [`evidence_store::EvidenceStore`] | evidence lifecycle, checkpoints |
//! | [`completion::CompletionService`] | debate turns and arbitration |
//! | [`tool_executor::ToolExecutorPort`] | debate turns |
//! | [`clock::Clock`] | everything time-dependent |

pub mod clock;
pub mod completion;
pub mod conversation_logger;
pub mod evidence_store;
pub mod fast_cache;
pub mod progress;
pub mod semantic_index;
pub mod tool_executor;
