//! Evidence Lifecycle service
//!
//! Persists every gateway result as an [`EvidenceDoc`](tribunal_domain::EvidenceDoc)
//! and drives it through the verification state machine.

pub mod lifecycle;

pub use lifecycle::{EvidenceError, EvidenceLifecycle};
