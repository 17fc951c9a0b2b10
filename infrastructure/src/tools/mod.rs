//! Tool adapters
//!
//! Concrete [`ToolAdapter`](tribunal_domain::ToolAdapter) implementations
//! registered with the gateway's `ToolRegistry`:
//!
//! - `fixture`: canned responses keyed by entity code (demos, tests)
//! - `blocking`: wraps synchronous provider functions
//! - `http` (feature `http-tools`): remote JSON endpoints via `reqwest`
//!
//! `catalog` holds the financial tool definitions, aliases, guardrails and
//! category preferences the demo and pipeline tests register.

pub mod blocking;
pub mod catalog;
pub mod fixture;
#[cfg(feature = "http-tools")]
pub mod http;

pub use blocking::BlockingToolAdapter;
pub use fixture::{FixtureErrorKind, FixtureResponse, FixtureSpec, FixtureToolAdapter};
#[cfg(feature = "http-tools")]
pub use http::HttpJsonToolAdapter;
