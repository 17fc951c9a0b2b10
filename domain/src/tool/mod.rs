//! Tool domain module
//!
//! Pure definitions for the **Tool Gateway**: how agents reach external data
//! providers through a uniform, validated and classified contract.
//!
//! # Overview
//!
//! Every provider sits behind a [`ToolAdapter`] that reports a
//! [`ToolDefinition`] (name, version, parameter schema, family, lifecycle
//! class). A [`ToolCall`] flows through normalization, guardrails and
//! validation before any network call, and every outcome is a
//! [`ToolResult`] carrying either a payload or a classified [`ToolError`].
//!
//! ```text
//! ToolCall ──▶ normalize_params ──▶ ProviderPolicy ──▶ ToolValidator ──▶ ToolAdapter
//!   (raw)       (aliases, noise)     (dates, paging)    (schema)          (invoke)
//!                      │
//!                      └─ inputs_hash(tool, params) ──▶ cache / working memory key
//! ```
//!
//! # Tool Name Aliases
//!
//! Models frequently invent tool names (`stock_price` instead of
//! `verified_price`). [`ToolSpec`] resolves aliases to canonical names
//! without an extra completion round-trip:
//!
//! - [`ToolSpec::resolve`]: canonical or alias name → canonical name
//! - [`ToolSpec::get_resolved`]: definition lookup by canonical or alias name
//!
//! # Error Tiers
//!
//! | Tier | Examples | Caller policy |
//! |------|----------|---------------|
//! | **Recoverable** | rate limited, range too wide, provider timeout | adjust parameters or use another tool |
//! | **Terminal** | not found, unknown entity | do not repeat the query |
//! | **Fatal** | unauthorized, permission denied | abandon the tool family for the session |
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application** (`ToolGateway`): rate limiting, caching, circuit breaking
//! - **Infrastructure**: concrete adapters (fixtures, blocking, HTTP)

pub mod adapter;
pub mod entities;
pub mod guardrails;
pub mod params;
pub mod traits;
pub mod ttl;
pub mod value_objects;

pub use adapter::{AdapterError, ToolAdapter, classify_payload, provider_error};
pub use entities::{
    LifecycleClass, ParamType, Params, ToolCall, ToolCategory, ToolDefinition, ToolParameter,
    ToolSpec,
};
pub use guardrails::{GuardrailOutcome, GuardrailPolicies, ProviderPolicy};
pub use params::{ENTITY_KEY, NormalizedParams, entity_code, inputs_hash, normalize_params};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use ttl::TtlPolicy;
pub use value_objects::{ErrorTier, ToolError, ToolResult, ToolResultMetadata};
