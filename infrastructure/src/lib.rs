//! Infrastructure layer for tribunal
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the in-memory fast cache, semantic index
//! and evidence store, tool adapters, a scripted completion service,
//! configuration file loading and the JSONL debate logger.

pub mod cache;
pub mod completion;
pub mod config;
pub mod index;
pub mod logging;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use cache::InMemoryFastCache;
pub use completion::{AgentScript, ScriptedCompletionService, ScriptedReply};
pub use config::{ConfigError, ConfigLoader, FileConfig, FileLoggingConfig};
pub use index::{Embedder, HashingEmbedder, InMemorySemanticIndex};
pub use logging::JsonlConversationLogger;
pub use store::InMemoryEvidenceStore;
pub use tools::{
    BlockingToolAdapter, FixtureErrorKind, FixtureResponse, FixtureSpec, FixtureToolAdapter,
    catalog,
};
#[cfg(feature = "http-tools")]
pub use tools::HttpJsonToolAdapter;
