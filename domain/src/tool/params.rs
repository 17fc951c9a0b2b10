//! Parameter normalization and content-derived keys.
//!
//! Agents and upstream code spell the same request many ways
//! (`ticker`, `symbol`, `id`, ...). Normalization folds those spellings
//! onto the tool's declared schema so that identical requests hash to the
//! same key: the gateway cache, the working memory and the evidence
//! `inputs_hash` all derive from [`inputs_hash`].

use sha2::{Digest, Sha256};

use super::entities::{Params, ToolDefinition};

/// Canonical parameter name for the subject entity.
pub const ENTITY_KEY: &str = "entity_code";

/// Spellings that all mean "the entity this call is about".
pub const ENTITY_ALIASES: &[&str] = &[
    "entity_code",
    "ticker",
    "symbol",
    "id",
    "code",
    "stock_code",
    "ts_code",
    "sec_code",
];

/// Pagination/limit options every provider understands; kept even when a
/// schema does not declare them.
pub const PASSTHROUGH_PARAMS: &[&str] = &["limit", "page", "page_size", "offset", "cursor"];

/// Fields that vary per request without changing the answer.
pub const NOISE_FIELDS: &[&str] = &[
    "timestamp",
    "ts",
    "_ts",
    "request_id",
    "trace_id",
    "nonce",
    "_",
];

/// Result of [`normalize_params`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedParams {
    pub params: Params,
    /// Names of parameters that were dropped as unknown
    pub dropped: Vec<String>,
}

/// Resolve aliases and drop parameters the tool does not declare.
///
/// - An entity alias (`ticker`, `symbol`, ...) not declared by the schema
///   is renamed to whichever entity spelling the schema does declare.
///   An explicitly supplied canonical name wins over an alias.
/// - String values are trimmed.
/// - Undeclared parameters are dropped, except [`PASSTHROUGH_PARAMS`].
/// - Noise fields are always dropped.
pub fn normalize_params(definition: &ToolDefinition, raw: &Params) -> NormalizedParams {
    let declared_entity = ENTITY_ALIASES
        .iter()
        .copied()
        .find(|alias| definition.declares(alias));

    let mut params = Params::new();
    let mut dropped = Vec::new();

    // Declared names first so they take priority over aliases.
    let mut keys: Vec<&String> = raw.keys().collect();
    keys.sort_by_key(|k| !definition.declares(k));

    for key in keys {
        let value = trim_value(&raw[key.as_str()]);

        if NOISE_FIELDS.contains(&key.as_str()) {
            continue;
        }

        if definition.declares(key) {
            params.insert(key.clone(), value);
            continue;
        }

        if ENTITY_ALIASES.contains(&key.as_str())
            && let Some(target) = declared_entity
        {
            params.entry(target.to_string()).or_insert(value);
            continue;
        }

        if PASSTHROUGH_PARAMS.contains(&key.as_str()) {
            params.insert(key.clone(), value);
            continue;
        }

        dropped.push(key.clone());
    }

    dropped.sort();
    NormalizedParams { params, dropped }
}

fn trim_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(s.trim().to_string()),
        other => other.clone(),
    }
}

/// The entity code a parameter set refers to, if any.
pub fn entity_code(params: &Params) -> Option<String> {
    ENTITY_ALIASES.iter().find_map(|k| match params.get(*k) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deterministic key for a (tool, normalized params) pair.
///
/// Noise fields are stripped before hashing. `Params` keeps keys sorted,
/// so the serialized form, and therefore the key, is stable.
pub fn inputs_hash(tool_name: &str, params: &Params) -> String {
    let mut stable = params.clone();
    for noise in NOISE_FIELDS {
        stable.remove(*noise);
    }
    let canonical = serde_json::Value::Object(stable).to_string();

    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ToolParameter};
    use serde_json::json;

    fn price_tool() -> ToolDefinition {
        ToolDefinition::new("verified_price", "Price")
            .with_parameter(ToolParameter::new(ENTITY_KEY, "Entity", true))
            .with_parameter(ToolParameter::new("start_date", "Start", false).with_type(ParamType::Date))
    }

    fn params(value: serde_json::Value) -> Params {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_alias_resolves_to_declared_entity_key() {
        let out = normalize_params(&price_tool(), &params(json!({"ticker": " 600519.SH "})));
        assert_eq!(out.params.get(ENTITY_KEY), Some(&json!("600519.SH")));
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let out = normalize_params(
            &price_tool(),
            &params(json!({"symbol": "AAPL", "entity_code": "MSFT"})),
        );
        assert_eq!(out.params.get(ENTITY_KEY), Some(&json!("MSFT")));
    }

    #[test]
    fn test_unknown_params_dropped_except_pagination() {
        let out = normalize_params(
            &price_tool(),
            &params(json!({"entity_code": "X", "colour": "red", "limit": 10, "request_id": "abc"})),
        );
        assert_eq!(out.params.get("limit"), Some(&json!(10)));
        assert!(!out.params.contains_key("colour"));
        assert!(!out.params.contains_key("request_id"));
        assert_eq!(out.dropped, vec!["colour".to_string()]);
    }

    #[test]
    fn test_inputs_hash_is_stable_across_spellings() {
        let tool = price_tool();
        let a = normalize_params(&tool, &params(json!({"ticker": "X", "start_date": "2024-01-01"})));
        let b = normalize_params(&tool, &params(json!({"start_date": "2024-01-01", "symbol": "X"})));
        assert_eq!(inputs_hash("verified_price", &a.params), inputs_hash("verified_price", &b.params));
    }

    #[test]
    fn test_inputs_hash_ignores_noise_and_separates_tools() {
        let base = params(json!({"entity_code": "X"}));
        let noisy = params(json!({"entity_code": "X", "timestamp": 12345}));
        assert_eq!(inputs_hash("t", &base), inputs_hash("t", &noisy));
        assert_ne!(inputs_hash("t", &base), inputs_hash("u", &base));
    }

    #[test]
    fn test_entity_code_lookup() {
        assert_eq!(entity_code(&params(json!({"ticker": "AAPL"}))).as_deref(), Some("AAPL"));
        assert_eq!(entity_code(&params(json!({"id": 42}))).as_deref(), Some("42"));
        assert_eq!(entity_code(&params(json!({"limit": 5}))), None);
    }
}
