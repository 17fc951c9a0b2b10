//! Completion service adapters.

mod scripted;

pub use scripted::{AgentScript, ScriptedCompletionService, ScriptedReply, agent_id_of};
