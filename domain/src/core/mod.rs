//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`clock`]: time helpers shared by TTL and recency computations

pub mod clock;
pub mod error;
