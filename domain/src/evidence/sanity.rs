//! Deterministic sanity checks applied by `verify`.

use serde_json::Value;

use crate::tool::adapter::provider_error;

/// Field that holds the canonical record array in provider payloads.
pub const CANONICAL_DATA_FIELD: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanityVerdict {
    Pass,
    Reject(String),
}

impl SanityVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, SanityVerdict::Pass)
    }
}

/// Inspect a payload for signs that it carries no usable facts.
///
/// Rejected: a missing or null payload, an explicit provider error flag,
/// an empty canonical `data` array, and an empty top-level array.
pub fn inspect_payload(payload: Option<&Value>) -> SanityVerdict {
    let Some(payload) = payload else {
        return SanityVerdict::Reject("no payload".to_string());
    };

    if payload.is_null() {
        return SanityVerdict::Reject("null payload".to_string());
    }

    if let Some(message) = provider_error(payload) {
        return SanityVerdict::Reject(format!("provider error: {}", message));
    }

    match payload {
        Value::Array(items) if items.is_empty() => {
            SanityVerdict::Reject("empty result array".to_string())
        }
        Value::Object(obj) => match obj.get(CANONICAL_DATA_FIELD) {
            Some(Value::Array(items)) if items.is_empty() => {
                SanityVerdict::Reject("empty canonical data array".to_string())
            }
            Some(Value::Null) => SanityVerdict::Reject("null canonical data".to_string()),
            _ => SanityVerdict::Pass,
        },
        _ => SanityVerdict::Pass,
    }
}

/// Whether a payload is an empty result set (used for data-honesty warnings).
pub fn is_empty_result(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => matches!(
            obj.get(CANONICAL_DATA_FIELD),
            Some(Value::Array(items)) if items.is_empty()
        ) || matches!(obj.get(CANONICAL_DATA_FIELD), Some(Value::Null)),
        _ => false,
    }
}
