//! Semantic index port
//!
//! Collection-scoped upsert and nearest-neighbor search with a metadata
//! filter. Backs long-term memory.

use async_trait::async_trait;
use thiserror::Error;
use tribunal_domain::{LongTermMemoryEntry, SearchFilter, SearchHit};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Index backend error: {0}")]
    Backend(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Insert or replace entries (by id) in a collection. Returns the count written.
    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<LongTermMemoryEntry>,
    ) -> Result<usize, IndexError>;

    /// Nearest neighbors of `query` among entries matching `filter`, best first.
    async fn search(
        &self,
        collection: &str,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError>;
}
