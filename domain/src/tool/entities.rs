//! Tool domain entities
//!
//! A [`ToolDefinition`] is what an adapter reports from `describe()`: its
//! name, version, parameter schema, and the metadata the rest of the
//! pipeline keys on (family for guardrails and circuit breaking, category
//! for equipment redirection, lifecycle class for TTLs).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Tool parameters after JSON decoding.
///
/// `serde_json::Map` keeps keys sorted, which makes serialized parameter
/// sets stable for hashing.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// How quickly a tool's data goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleClass {
    /// Live quotes, order books
    Realtime,
    /// Intraday bars, news flow
    Intraday,
    /// End-of-day prices, daily statistics
    #[default]
    Daily,
    /// Reference data: listings, company profiles, filings
    Static,
}

impl LifecycleClass {
    /// Default TTL for verified evidence of this class.
    pub fn default_ttl(&self) -> Duration {
        match self {
            LifecycleClass::Realtime => Duration::from_secs(5 * 60),
            LifecycleClass::Intraday => Duration::from_secs(60 * 60),
            LifecycleClass::Daily => Duration::from_secs(24 * 60 * 60),
            LifecycleClass::Static => Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Volatile data must carry a staleness warning once it ages.
    pub fn is_volatile(&self) -> bool {
        matches!(self, LifecycleClass::Realtime | LifecycleClass::Intraday)
    }

    pub fn as_str(&self) -> &str {
        match self {
            LifecycleClass::Realtime => "realtime",
            LifecycleClass::Intraday => "intraday",
            LifecycleClass::Daily => "daily",
            LifecycleClass::Static => "static",
        }
    }
}

impl std::fmt::Display for LifecycleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Functional category of a tool, used to redirect requests for tools an
/// agent is not equipped with to an equivalent one it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Price,
    Financials,
    News,
    Macro,
    Reference,
    Search,
    #[default]
    Other,
}

impl ToolCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ToolCategory::Price => "price",
            ToolCategory::Financials => "financials",
            ToolCategory::News => "news",
            ToolCategory::Macro => "macro",
            ToolCategory::Reference => "reference",
            ToolCategory::Search => "search",
            ToolCategory::Other => "other",
        }
    }

    /// Guess a category from a tool name the registry does not know.
    ///
    /// Agents regularly invent names like `get_stock_price` or
    /// `fetch_news`; the keyword table maps them onto a category so the
    /// request can still be routed.
    pub fn infer_from_name(name: &str) -> ToolCategory {
        let name = name.to_ascii_lowercase();
        let table: [(&[&str], ToolCategory); 6] = [
            (&["price", "quote", "kline", "ohlc", "daily", "bar"], ToolCategory::Price),
            (
                &["financial", "income", "balance", "cashflow", "earning", "fundamental"],
                ToolCategory::Financials,
            ),
            (&["news", "headline", "announcement"], ToolCategory::News),
            (&["macro", "rate", "cpi", "gdp", "yield", "shibor"], ToolCategory::Macro),
            (&["profile", "listing", "company", "basic", "info"], ToolCategory::Reference),
            (&["search", "web", "lookup"], ToolCategory::Search),
        ];
        table
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
            .map(|(_, category)| *category)
            .unwrap_or(ToolCategory::Other)
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON type a parameter must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// `YYYY-MM-DD` or `YYYYMMDD`
    Date,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    #[serde(default)]
    pub description: String,
    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
    /// Expected JSON type
    #[serde(default)]
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Schema and metadata of one tool, as reported by its adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "verified_price")
    pub name: String,
    /// Adapter version string
    #[serde(default = "default_version")]
    pub version: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Provider family; guardrail policies and the Fatal circuit breaker
    /// are scoped per family.
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub category: ToolCategory,
    #[serde(default)]
    pub lifecycle: LifecycleClass,
    /// Whether verified results may be promoted to long-term memory
    #[serde(default = "default_true")]
    pub long_term_eligible: bool,
    /// Topic-agnostic data (rates, indices) goes to the global macro
    /// collection instead of the session collection.
    #[serde(default)]
    pub global_scope: bool,
    /// Parameter specifications
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_true() -> bool {
    true
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: description.into(),
            family: String::new(),
            category: ToolCategory::Other,
            lifecycle: LifecycleClass::Daily,
            long_term_eligible: true,
            global_scope: false,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleClass) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_long_term(mut self, eligible: bool) -> Self {
        self.long_term_eligible = eligible;
        self
    }

    pub fn with_global_scope(mut self, global: bool) -> Self {
        self.global_scope = global;
        self
    }

    /// Family used for guardrails; falls back to the tool name.
    pub fn family_or_name(&self) -> &str {
        if self.family.is_empty() {
            &self.name
        } else {
            &self.family
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}

/// Registry view of available tools plus tool-name aliases.
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: HashMap<String, ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "stock_price" → "verified_price")
    aliases: HashMap<String, String>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    /// Register a single alias mapping (builder pattern)
    pub fn register_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Register multiple aliases at once (builder pattern)
    pub fn register_aliases(
        mut self,
        mappings: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        for (alias, canonical) in mappings {
            self.aliases.insert(alias.into(), canonical.into());
        }
        self
    }

    /// Resolve a name: returns canonical name if it's a registered tool,
    /// or resolves alias, or None if unknown
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.aliases
                .get(name)
                .map(|s| s.as_str())
                .filter(|canonical| self.tools.contains_key(*canonical))
        }
    }

    /// Get tool definition by canonical name or alias
    pub fn get_resolved(&self, name: &str) -> Option<&ToolDefinition> {
        self.resolve(name).and_then(|canonical| self.tools.get(canonical))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions restricted to an allow-list, in allow-list order.
    pub fn subset<'a>(&'a self, names: &'a [String]) -> impl Iterator<Item = &'a ToolDefinition> {
        names.iter().filter_map(|n| self.tools.get(n))
    }
}

/// A call to a tool with arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub arguments: Params,
    /// Optional reasoning for why this tool is being called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Params::new(),
            reasoning: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Params) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_ttls_are_ordered() {
        assert!(LifecycleClass::Realtime.default_ttl() < LifecycleClass::Intraday.default_ttl());
        assert!(LifecycleClass::Intraday.default_ttl() < LifecycleClass::Daily.default_ttl());
        assert!(LifecycleClass::Daily.default_ttl() < LifecycleClass::Static.default_ttl());
        assert!(LifecycleClass::Realtime.is_volatile());
        assert!(!LifecycleClass::Static.is_volatile());
    }

    #[test]
    fn test_infer_category_from_name() {
        assert_eq!(ToolCategory::infer_from_name("get_stock_price"), ToolCategory::Price);
        assert_eq!(ToolCategory::infer_from_name("fetch_news"), ToolCategory::News);
        assert_eq!(ToolCategory::infer_from_name("income_statement"), ToolCategory::Financials);
        assert_eq!(ToolCategory::infer_from_name("frobnicate"), ToolCategory::Other);
    }

    #[test]
    fn test_tool_spec_aliases() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("verified_price", "Price"))
            .register_alias("stock_price", "verified_price")
            .register_alias("dangling", "missing_tool");

        assert_eq!(spec.resolve("verified_price"), Some("verified_price"));
        assert_eq!(spec.resolve("stock_price"), Some("verified_price"));
        assert_eq!(spec.resolve("dangling"), None);
        assert_eq!(spec.get_resolved("stock_price").unwrap().name, "verified_price");
        assert!(spec.get("stock_price").is_none());
    }

    #[test]
    fn test_family_falls_back_to_name() {
        let def = ToolDefinition::new("macro_rates", "Rates");
        assert_eq!(def.family_or_name(), "macro_rates");
        let def = def.with_family("pboc");
        assert_eq!(def.family_or_name(), "pboc");
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let def: ToolDefinition = serde_json::from_value(serde_json::json!({
            "name": "exchange_daily",
            "category": "price",
            "parameters": [{"name": "entity_code", "required": true}]
        }))
        .unwrap();
        assert_eq!(def.version, "1");
        assert_eq!(def.lifecycle, LifecycleClass::Daily);
        assert!(def.long_term_eligible);
        assert!(def.declares("entity_code"));
    }
}
