//! Hippocampal Memory
//!
//! Two tiers over the evidence lifecycle:
//!
//! - **Working memory** in the fast cache: exact-match, TTL-scoped items
//!   derived 1:1 from VERIFIED evidence. Reads slide the TTL; adoption
//!   stretches it. Low-importance items are actively evicted.
//! - **Long-term memory** in the semantic index: summaries of high-value
//!   items, promoted in batches by [`HippocampalMemory::consolidate`].
//!
//! Cache layout:
//!
//! | Key | Value |
//! |-----|-------|
//! | `wm:{hash}` | serialized [`WorkingMemoryItem`](tribunal_domain::WorkingMemoryItem) |
//! | `wmc:{hash}:{counter}` | integer counter (`retrieved`, `adopted`, `success`, `misleading`) |

pub mod consolidation;
pub mod hippocampus;

pub use consolidation::spawn_consolidation_loop;
pub use hippocampus::{
    ConsolidationReport, EvidenceOutcome, HippocampalMemory, MemoryError, WorkingMemoryHit,
};
