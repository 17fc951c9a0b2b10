//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_turn;
pub mod arbitration;
pub mod run_debate;
