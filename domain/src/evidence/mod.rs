//! Evidence domain module
//!
//! An [`EvidenceDoc`] is a tool result wrapped with provenance and a trust
//! lifecycle. Every gateway result becomes a DRAFT record; a deterministic
//! sanity pass then moves it to VERIFIED or QUARANTINE.
//!
//! ```text
//!            verify ok            ttl elapsed           retention
//!   DRAFT ──────────────▶ VERIFIED ──────────▶ STALE ──────────▶ ARCHIVED
//!     │                      │                                     ▲
//!     │ empty / error        └──────────── archive ────────────────┤
//!     ▼                                                            │
//!   QUARANTINE ────────────────────── archive ─────────────────────┘
//! ```
//!
//! Nothing ever returns to VERIFIED. Fresher data means a new tool call and
//! a new record; existing records are never overwritten.

pub mod checkpoint;
pub mod entities;
pub mod sanity;

pub use checkpoint::Checkpoint;
pub use entities::{
    EvidenceDoc, EvidenceId, EvidenceStatus, TRUST_DRAFT, TRUST_QUARANTINE, TRUST_VERIFIED,
    VerificationEvent, VerificationEventKind,
};
pub use sanity::{SanityVerdict, inspect_payload};
