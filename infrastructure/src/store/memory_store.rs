//! In-process [`EvidenceStore`].
//!
//! Records are kept in insertion order so status and hash queries come
//! back oldest first without sorting.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tribunal_application::ports::evidence_store::{EvidenceStore, StoreError};
use tribunal_domain::{Checkpoint, EvidenceDoc, EvidenceId, EvidenceStatus};

#[derive(Default)]
struct Records {
    docs: Vec<EvidenceDoc>,
    positions: HashMap<EvidenceId, usize>,
    checkpoints: HashMap<String, Vec<Checkpoint>>,
}

#[derive(Default)]
pub struct InMemoryEvidenceStore {
    records: RwLock<Records>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Records>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Records>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    /// Number of evidence records.
    pub fn len(&self) -> usize {
        self.read().map(|r| r.docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record count per status.
    pub fn status_counts(&self) -> HashMap<EvidenceStatus, usize> {
        let mut counts = HashMap::new();
        if let Ok(records) = self.read() {
            for doc in &records.docs {
                *counts.entry(doc.status).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn create(&self, doc: &EvidenceDoc) -> Result<(), StoreError> {
        let mut records = self.write()?;
        if records.positions.contains_key(&doc.id) {
            return Err(StoreError::Conflict(doc.id.to_string()));
        }
        let position = records.docs.len();
        records.positions.insert(doc.id.clone(), position);
        records.docs.push(doc.clone());
        Ok(())
    }

    async fn update(&self, doc: &EvidenceDoc) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let position = *records
            .positions
            .get(&doc.id)
            .ok_or_else(|| StoreError::NotFound(doc.id.to_string()))?;
        records.docs[position] = doc.clone();
        Ok(())
    }

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceDoc>, StoreError> {
        let records = self.read()?;
        Ok(records.positions.get(id).map(|&p| records.docs[p].clone()))
    }

    async fn query_by_status(&self, status: EvidenceStatus) -> Result<Vec<EvidenceDoc>, StoreError> {
        Ok(self
            .read()?
            .docs
            .iter()
            .filter(|d| d.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_hash(&self, inputs_hash: &str) -> Result<Vec<EvidenceDoc>, StoreError> {
        Ok(self
            .read()?
            .docs
            .iter()
            .filter(|d| d.inputs_hash == inputs_hash)
            .cloned()
            .collect())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let session = records
            .checkpoints
            .entry(checkpoint.session_id.clone())
            .or_default();
        session.retain(|c| c.id != checkpoint.id);
        session.push(checkpoint.clone());
        Ok(())
    }

    async fn latest_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self
            .read()?
            .checkpoints
            .get(session_id)
            .and_then(|all| all.iter().max_by_key(|c| c.round))
            .cloned())
    }
}
