//! Memory domain module
//!
//! Pure policy for the two-tier hippocampal memory:
//!
//! - [`working`]: exact-match cache items, importance scoring, freshness
//! - [`long_term`]: consolidated summaries, collections, search filters
//!
//! Storage and scheduling live in the application layer.

pub mod long_term;
pub mod working;

pub use long_term::{
    LongTermMemoryEntry, LongTermMetadata, MemoryCollection, SearchFilter, SearchHit,
    is_error_like, summarize,
};
pub use working::{
    Freshness, ImportanceModel, ImportanceWeights, MemoryCounters, WorkingMemoryItem,
    effective_ttl,
};
