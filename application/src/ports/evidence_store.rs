//! Evidence persistence port

use async_trait::async_trait;
use thiserror::Error;
use tribunal_domain::{Checkpoint, EvidenceDoc, EvidenceId, EvidenceStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Evidence not found: {0}")]
    NotFound(String),

    #[error("Evidence already exists: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Durable record store for evidence and checkpoints.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Insert a new record; fails with `Conflict` if the id exists.
    async fn create(&self, doc: &EvidenceDoc) -> Result<(), StoreError>;

    /// Replace an existing record; fails with `NotFound` if it does not exist.
    async fn update(&self, doc: &EvidenceDoc) -> Result<(), StoreError>;

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceDoc>, StoreError>;

    async fn query_by_status(&self, status: EvidenceStatus) -> Result<Vec<EvidenceDoc>, StoreError>;

    /// All records for an inputs hash, oldest first.
    async fn find_by_hash(&self, inputs_hash: &str) -> Result<Vec<EvidenceDoc>, StoreError>;

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError>;

    /// Highest-round checkpoint of a session.
    async fn latest_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError>;
}
