//! Long-term memory entries
//!
//! Consolidated working-memory items are stored as short textual summaries
//! in a semantic index, partitioned into one collection per session plus a
//! cross-session global macro collection for topic-agnostic facts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

use super::working::WorkingMemoryItem;
use crate::core::clock::{Timestamp, elapsed};
use crate::tool::adapter::provider_error;
use crate::util::json_preview;

const SUMMARY_PAYLOAD_BYTES: usize = 600;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum MemoryCollection {
    Session(String),
    GlobalMacro,
}

impl MemoryCollection {
    pub fn name(&self) -> String {
        match self {
            MemoryCollection::Session(id) => format!("session:{}", id),
            MemoryCollection::GlobalMacro => "global_macro".to_string(),
        }
    }

    /// Collection an item is promoted into.
    pub fn for_item(item: &WorkingMemoryItem) -> Self {
        if item.global_scope {
            MemoryCollection::GlobalMacro
        } else {
            MemoryCollection::Session(item.session_id.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermMetadata {
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_code: Option<String>,
    pub volatile: bool,
    pub evidence_id: String,
    pub session_id: String,
    pub recorded_at: Timestamp,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermMemoryEntry {
    /// Stable per source item, so re-promotion overwrites instead of duplicating
    pub id: String,
    pub collection: MemoryCollection,
    pub text: String,
    pub metadata: LongTermMetadata,
}

impl LongTermMemoryEntry {
    pub fn from_item(item: &WorkingMemoryItem, importance: f64) -> Self {
        Self {
            id: item.key.clone(),
            collection: MemoryCollection::for_item(item),
            text: summarize(item),
            metadata: LongTermMetadata {
                tool_name: item.tool_name.clone(),
                entity_code: item.entity_code.clone(),
                volatile: item.lifecycle.is_volatile(),
                evidence_id: item.evidence_id.to_string(),
                session_id: item.session_id.clone(),
                recorded_at: item.created_at,
                importance,
            },
        }
    }
}

/// Text embedded for an item: tool, entity, parameters and a payload preview.
pub fn summarize(item: &WorkingMemoryItem) -> String {
    let params = serde_json::Value::Object(item.params.clone());
    format!(
        "{} [{}] params={} result={}",
        item.tool_name,
        item.entity_code.as_deref().unwrap_or("-"),
        params,
        json_preview(&item.payload, SUMMARY_PAYLOAD_BYTES)
    )
}

static ERROR_TEXT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(traceback \(most recent call last\)|\bexception\b|panicked at|stack trace|\berror:\s)")
        .ok()
});

/// Whether a payload looks like an error dump rather than data.
pub fn is_error_like(payload: &serde_json::Value) -> bool {
    if provider_error(payload).is_some() {
        return true;
    }
    let text = payload.to_string();
    ERROR_TEXT.as_ref().is_some_and(|re| re.is_match(&text))
}

/// Metadata filter for semantic search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatile: Option<bool>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_name = Some(tool.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity_code = Some(entity.into());
        self
    }

    pub fn with_volatile(mut self, volatile: bool) -> Self {
        self.volatile = Some(volatile);
        self
    }

    /// Entries that carry a different entity code never match an entity
    /// filter; entries without one (macro data) do.
    pub fn matches(&self, meta: &LongTermMetadata) -> bool {
        if let Some(tool) = &self.tool_name
            && &meta.tool_name != tool
        {
            return false;
        }
        if let Some(entity) = &self.entity_code
            && let Some(other) = &meta.entity_code
            && !other.eq_ignore_ascii_case(entity)
        {
            return false;
        }
        if let Some(volatile) = self.volatile
            && meta.volatile != volatile
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub entry: LongTermMemoryEntry,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_warning: Option<String>,
}

impl SearchHit {
    pub fn new(entry: LongTermMemoryEntry, score: f32) -> Self {
        Self {
            entry,
            score,
            stale_warning: None,
        }
    }

    /// Flag volatile entries older than `threshold`.
    pub fn annotate_staleness(mut self, now: Timestamp, threshold: Duration) -> Self {
        let age = elapsed(self.entry.metadata.recorded_at, now);
        if self.entry.metadata.volatile && age > threshold {
            self.stale_warning = Some(format!(
                "{} result for {} is {} days old; volatile data, re-fetch before citing",
                self.entry.metadata.tool_name,
                self.entry.metadata.entity_code.as_deref().unwrap_or("unknown entity"),
                age.as_secs() / 86_400
            ));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::add_duration;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn meta(entity: Option<&str>, volatile: bool) -> LongTermMetadata {
        LongTermMetadata {
            tool_name: "verified_price".into(),
            entity_code: entity.map(str::to_string),
            volatile,
            evidence_id: "e1".into(),
            session_id: "s1".into(),
            recorded_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            importance: 0.9,
        }
    }

    #[test]
    fn test_error_like_payloads() {
        assert!(is_error_like(&json!({"error": "boom"})));
        assert!(is_error_like(&json!("Traceback (most recent call last):\n  File x")));
        assert!(is_error_like(&json!({"text": "thread 'main' panicked at src/lib.rs"})));
        assert!(!is_error_like(&json!({"data": [{"close": 1710.5}]})));
    }

    #[test]
    fn test_entity_filter_excludes_mismatch() {
        let filter = SearchFilter::new().with_entity("600519.SH");
        assert!(filter.matches(&meta(Some("600519.sh"), false)));
        assert!(!filter.matches(&meta(Some("000858.SZ"), false)));
        assert!(filter.matches(&meta(None, false)));
    }

    #[test]
    fn test_tool_and_volatile_filters() {
        let m = meta(Some("X"), true);
        assert!(SearchFilter::new().with_tool("verified_price").matches(&m));
        assert!(!SearchFilter::new().with_tool("news").matches(&m));
        assert!(!SearchFilter::new().with_volatile(false).matches(&m));
    }

    #[test]
    fn test_stale_annotation_only_for_old_volatile() {
        let entry = LongTermMemoryEntry {
            id: "k".into(),
            collection: MemoryCollection::Session("s1".into()),
            text: "t".into(),
            metadata: meta(Some("X"), true),
        };
        let recorded = entry.metadata.recorded_at;
        let week = Duration::from_secs(7 * 86_400);

        let hit = SearchHit::new(entry.clone(), 0.9)
            .annotate_staleness(add_duration(recorded, week), Duration::from_secs(3 * 86_400));
        assert!(hit.stale_warning.unwrap().contains("7 days"));

        let hit = SearchHit::new(entry, 0.9)
            .annotate_staleness(add_duration(recorded, Duration::from_secs(3600)), Duration::from_secs(3 * 86_400));
        assert!(hit.stale_warning.is_none());
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(MemoryCollection::Session("d1".into()).name(), "session:d1");
        assert_eq!(MemoryCollection::GlobalMacro.name(), "global_macro");
    }
}
