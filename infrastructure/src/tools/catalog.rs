//! Financial tool catalog.
//!
//! Definitions for the market-data tools the demo scenarios and the
//! pipeline tests register, together with the aliases agents commonly
//! invent, the per-family guardrails and the category preference table.
//!
//! | Tool | Family | Category | Lifecycle |
//! |------|--------|----------|-----------|
//! | `verified_price` | `exchange` | price | daily |
//! | `exchange_daily` | `exchange` | price | daily |
//! | `generic_quote` | `aggregator` | price | realtime |
//! | `financial_statements` | `filings` | financials | static |
//! | `company_profile` | `filings` | reference | static |
//! | `news_search` | `newswire` | news | intraday |
//! | `macro_indicator` | `macro` | macro | daily (global) |

use tribunal_domain::{
    CategoryTable, GuardrailPolicies, LifecycleClass, ParamType, ProviderPolicy, ToolCategory,
    ToolDefinition, ToolParameter,
};

pub const VERIFIED_PRICE: &str = "verified_price";
pub const EXCHANGE_DAILY: &str = "exchange_daily";
pub const GENERIC_QUOTE: &str = "generic_quote";
pub const FINANCIAL_STATEMENTS: &str = "financial_statements";
pub const COMPANY_PROFILE: &str = "company_profile";
pub const NEWS_SEARCH: &str = "news_search";
pub const MACRO_INDICATOR: &str = "macro_indicator";

fn entity_param() -> ToolParameter {
    ToolParameter::new("entity_code", "Exchange-qualified code, e.g. 600519.SH", true)
}

fn date_param(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, false).with_type(ParamType::Date)
}

fn limit_param() -> ToolParameter {
    ToolParameter::new("limit", "Maximum number of rows", false).with_type(ParamType::Integer)
}

pub fn verified_price_definition() -> ToolDefinition {
    ToolDefinition::new(
        VERIFIED_PRICE,
        "Exchange-verified daily OHLC bars for one security",
    )
    .with_family("exchange")
    .with_category(ToolCategory::Price)
    .with_lifecycle(LifecycleClass::Daily)
    .with_parameter(entity_param())
    .with_parameter(date_param("start_date", "First trading day (inclusive)"))
    .with_parameter(date_param("end_date", "Last trading day (inclusive)"))
    .with_parameter(limit_param())
}

pub fn exchange_daily_definition() -> ToolDefinition {
    ToolDefinition::new(EXCHANGE_DAILY, "Raw exchange daily statistics (volume, turnover)")
        .with_family("exchange")
        .with_category(ToolCategory::Price)
        .with_lifecycle(LifecycleClass::Daily)
        .with_parameter(entity_param())
        .with_parameter(date_param("trade_date", "Trading day"))
        .with_parameter(limit_param())
}

pub fn generic_quote_definition() -> ToolDefinition {
    ToolDefinition::new(GENERIC_QUOTE, "Delayed quote from a public aggregator")
        .with_family("aggregator")
        .with_category(ToolCategory::Price)
        .with_lifecycle(LifecycleClass::Realtime)
        .with_long_term(false)
        .with_parameter(entity_param())
}

pub fn financial_statements_definition() -> ToolDefinition {
    ToolDefinition::new(
        FINANCIAL_STATEMENTS,
        "Reported income statement, balance sheet and cash flow",
    )
    .with_family("filings")
    .with_category(ToolCategory::Financials)
    .with_lifecycle(LifecycleClass::Static)
    .with_parameter(entity_param())
    .with_parameter(ToolParameter::new("period", "Report period, e.g. 2025Q4", false))
}

pub fn company_profile_definition() -> ToolDefinition {
    ToolDefinition::new(COMPANY_PROFILE, "Listing, industry classification and share count")
        .with_family("filings")
        .with_category(ToolCategory::Reference)
        .with_lifecycle(LifecycleClass::Static)
        .with_parameter(entity_param())
}

pub fn news_search_definition() -> ToolDefinition {
    ToolDefinition::new(NEWS_SEARCH, "Recent headlines and announcements")
        .with_family("newswire")
        .with_category(ToolCategory::News)
        .with_lifecycle(LifecycleClass::Intraday)
        .with_parameter(ToolParameter::new("query", "Keywords", true))
        .with_parameter(ToolParameter::new("entity_code", "Restrict to one security", false))
        .with_parameter(limit_param())
}

pub fn macro_indicator_definition() -> ToolDefinition {
    ToolDefinition::new(MACRO_INDICATOR, "Macro series such as LPR, CPI or the 10y yield")
        .with_family("macro")
        .with_category(ToolCategory::Macro)
        .with_lifecycle(LifecycleClass::Daily)
        .with_global_scope(true)
        .with_parameter(ToolParameter::new("indicator", "Series name, e.g. lpr_1y", true))
        .with_parameter(date_param("start_date", "First observation (inclusive)"))
        .with_parameter(date_param("end_date", "Last observation (inclusive)"))
}

/// All catalog definitions.
pub fn financial_definitions() -> Vec<ToolDefinition> {
    vec![
        verified_price_definition(),
        exchange_daily_definition(),
        generic_quote_definition(),
        financial_statements_definition(),
        company_profile_definition(),
        news_search_definition(),
        macro_indicator_definition(),
    ]
}

/// Catalog definition by name.
pub fn definition(name: &str) -> Option<ToolDefinition> {
    financial_definitions().into_iter().find(|d| d.name == name)
}

/// Names agents invent for catalog tools.
pub fn default_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("stock_price", VERIFIED_PRICE),
        ("get_price", VERIFIED_PRICE),
        ("daily_price", VERIFIED_PRICE),
        ("quote", GENERIC_QUOTE),
        ("financials", FINANCIAL_STATEMENTS),
        ("income_statement", FINANCIAL_STATEMENTS),
        ("news", NEWS_SEARCH),
        ("macro", MACRO_INDICATOR),
        ("profile", COMPANY_PROFILE),
    ]
}

/// Guardrails for the catalog's provider families.
pub fn default_guardrails() -> GuardrailPolicies {
    GuardrailPolicies::new()
        .with_policy(
            "exchange",
            ProviderPolicy::default()
                .with_page_size(120, 500)
                .with_max_span_days(366),
        )
        .with_policy("newswire", ProviderPolicy::default().with_page_size(20, 50))
        .with_policy(
            "macro",
            ProviderPolicy::default().with_max_span_days(3 * 366),
        )
}

/// Preferred substitutes per category, most trusted first.
pub fn default_category_table() -> CategoryTable {
    CategoryTable::new()
        .with_preference(ToolCategory::Price, [VERIFIED_PRICE, EXCHANGE_DAILY, GENERIC_QUOTE])
        .with_preference(ToolCategory::Financials, [FINANCIAL_STATEMENTS])
        .with_preference(ToolCategory::Reference, [COMPANY_PROFILE])
        .with_preference(ToolCategory::News, [NEWS_SEARCH])
        .with_preference(ToolCategory::Macro, [MACRO_INDICATOR])
}
