//! In-process vector index.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use tribunal_application::ports::semantic_index::{IndexError, SemanticIndex};
use tribunal_domain::{LongTermMemoryEntry, SearchFilter, SearchHit};

use super::embedder::{Embedder, HashingEmbedder, cosine};

struct Indexed {
    entry: LongTermMemoryEntry,
    vector: Vec<f32>,
}

type Collections = HashMap<String, Vec<Indexed>>;

pub struct InMemorySemanticIndex {
    embedder: Box<dyn Embedder>,
    collections: RwLock<Collections>,
    /// Hits scoring at or below this are dropped
    min_score: f32,
}

impl InMemorySemanticIndex {
    pub fn new() -> Self {
        Self::with_embedder(Box::new(HashingEmbedder::default()))
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
            min_score: 0.0,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, IndexError> {
        self.collections
            .read()
            .map_err(|_| IndexError::Backend("index lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, IndexError> {
        self.collections
            .write()
            .map_err(|_| IndexError::Backend("index lock poisoned".to_string()))
    }

    /// Number of entries in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.read()
            .map(|c| c.get(collection).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for InMemorySemanticIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SemanticIndex for InMemorySemanticIndex {
    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<LongTermMemoryEntry>,
    ) -> Result<usize, IndexError> {
        // embed outside the lock
        let indexed = entries
            .into_iter()
            .map(|entry| {
                let vector = self.embedder.embed(&entry.text)?;
                Ok(Indexed { entry, vector })
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        let count = indexed.len();
        let mut collections = self.write()?;
        let stored = collections.entry(collection.to_string()).or_default();
        for item in indexed {
            match stored.iter_mut().find(|s| s.entry.id == item.entry.id) {
                Some(existing) => *existing = item,
                None => stored.push(item),
            }
        }
        debug!(collection, count, total = stored.len(), "Upserted long-term entries");
        Ok(count)
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let query = self.embedder.embed(query)?;
        let collections = self.read()?;
        let Some(stored) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = stored
            .iter()
            .filter(|s| filter.matches(&s.entry.metadata))
            .map(|s| SearchHit::new(s.entry.clone(), cosine(&query, &s.vector)))
            .filter(|hit| hit.score > self.min_score)
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tribunal_domain::{LongTermMetadata, MemoryCollection};

    fn entry(id: &str, entity: Option<&str>, text: &str) -> LongTermMemoryEntry {
        LongTermMemoryEntry {
            id: id.to_string(),
            collection: MemoryCollection::Session("s1".into()),
            text: text.to_string(),
            metadata: LongTermMetadata {
                tool_name: "verified_price".into(),
                entity_code: entity.map(str::to_string),
                volatile: false,
                evidence_id: format!("ev-{}", id),
                session_id: "s1".into(),
                recorded_at: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
                importance: 0.9,
            },
        }
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let index = InMemorySemanticIndex::new();
        index
            .upsert(
                "session:s1",
                vec![
                    entry("a", Some("600519.SH"), "verified_price [600519.SH] close 1710.5"),
                    entry("b", Some("600519.SH"), "news_search [600519.SH] dividend announcement"),
                ],
            )
            .await
            .unwrap();

        let hits = index
            .search("session:s1", "600519.SH close price", &SearchFilter::new(), 5)
            .await
            .unwrap();
        assert_eq!(hits[0].entry.id, "a");
    }

    #[tokio::test]
    async fn test_filter_excludes_other_entities() {
        let index = InMemorySemanticIndex::new();
        index
            .upsert(
                "session:s1",
                vec![
                    entry("a", Some("600519.SH"), "verified_price close"),
                    entry("b", Some("000858.SZ"), "verified_price close"),
                    entry("m", None, "verified_price close macro"),
                ],
            )
            .await
            .unwrap();

        let filter = SearchFilter::new().with_entity("600519.SH");
        let hits = index
            .search("session:s1", "verified_price close", &filter, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.entry.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"m"));
        assert!(!ids.contains(&"b"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = InMemorySemanticIndex::new();
        index
            .upsert("c", vec![entry("a", None, "old text")])
            .await
            .unwrap();
        index
            .upsert("c", vec![entry("a", None, "new text")])
            .await
            .unwrap();
        assert_eq!(index.count("c"), 1);

        let hits = index
            .search("c", "new text", &SearchFilter::new(), 1)
            .await
            .unwrap();
        assert_eq!(hits[0].entry.text, "new text");
        assert!(index.search("missing", "x", &SearchFilter::new(), 1).await.unwrap().is_empty());
    }
}
