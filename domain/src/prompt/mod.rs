//! Prompt domain
//!
//! Templates for debater turns and for the chairman's fact lock and audits.

pub mod chairman;
pub mod debate;

pub use chairman::{CHAIRMAN_ID, ChairmanPromptTemplate};
pub use debate::DebatePromptTemplate;
