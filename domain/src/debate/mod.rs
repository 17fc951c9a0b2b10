//! Debate domain module
//!
//! Entities and pure policy for the turn-based debate loop:
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`agent`] | debaters, teams, disciplines, tool allow-lists |
//! | [`fact_lock`] | immutable subject/entity lock issued before round one |
//! | [`equipment`] | redirect unequipped tool requests by category |
//! | [`loop_guard`] | block identical (tool, params) calls within a turn |
//! | [`intent`] | parse model output into a typed [`AgentAction`] |
//! | [`turn`] | THINK / ACT / OBSERVE / SPEAK phases and turn records |
//! | [`transcript`] | append-only debate history |
//! | [`audit`] | chairman findings, corrections and deterministic pre-checks |

pub mod agent;
pub mod audit;
pub mod equipment;
pub mod fact_lock;
pub mod intent;
pub mod loop_guard;
pub mod transcript;
pub mod turn;

pub use agent::{AgentId, DebateAgent, Discipline};
pub use audit::{AuditFinding, AuditReport, ChairmanVerdict, Correction, FindingKind, precheck};
pub use equipment::{CategoryTable, EquipmentResolver, Equipped};
pub use fact_lock::FactLock;
pub use intent::{AgentAction, ToolIntent, extract_citations, extract_fenced_blocks, parse_agent_output};
pub use loop_guard::{LoopCheck, LoopGuard};
pub use transcript::{DebateTranscript, TranscriptEntry};
pub use turn::{BlockKind, CallOutcome, ToolCallRecord, TurnPhase, TurnRecord, TurnStep};
