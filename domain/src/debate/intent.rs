//! Model output parsing
//!
//! Agents act by emitting a fenced block:
//!
//! ````text
//! ```tool
//! {"tool": "verified_price", "args": {"entity_code": "600519.SH"}, "reasoning": "..."}
//! ```
//! ````
//!
//! A response without a `tool` fence is the agent's statement. A fence
//! whose body is not a valid intent yields [`AgentAction::Malformed`] so the
//! loop can ask for a corrected format instead of guessing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::evidence::entities::EvidenceId;
use crate::tool::entities::{Params, ToolCall};

/// Typed tool-call intent as emitted by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolIntent {
    pub tool: String,
    #[serde(default)]
    pub args: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ToolIntent {
    pub fn into_call(self) -> ToolCall {
        let call = ToolCall::new(self.tool).with_arguments(self.args);
        match self.reasoning {
            Some(reasoning) => call.with_reasoning(reasoning),
            None => call,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// ACT: invoke a tool
    CallTool(ToolCall),
    /// SPEAK: final statement for this turn
    Speak(String),
    /// A tool fence was present but unusable
    Malformed { raw: String, error: String },
}

/// Bodies of all ```` ```tag ```` fenced blocks in `text`, in order.
pub fn extract_fenced_blocks(text: &str, tag: &str) -> Vec<String> {
    let opening = format!("```{}", tag);
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_block && trimmed == opening {
            in_block = true;
            current.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            blocks.push(std::mem::take(&mut current));
        } else if in_block {
            current.push_str(line);
            current.push('\n');
        }
    }

    blocks
}

/// Parse one agent response. Only the first tool fence is honored; one
/// action per step.
pub fn parse_agent_output(text: &str) -> AgentAction {
    let blocks = extract_fenced_blocks(text, "tool");
    let Some(block) = blocks.into_iter().next() else {
        return AgentAction::Speak(text.trim().to_string());
    };

    match serde_json::from_str::<ToolIntent>(&block) {
        Ok(intent) if !intent.tool.trim().is_empty() => AgentAction::CallTool(intent.into_call()),
        Ok(_) => AgentAction::Malformed {
            raw: block,
            error: "missing tool name".to_string(),
        },
        Err(e) => AgentAction::Malformed {
            raw: block,
            error: e.to_string(),
        },
    }
}

static CITATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[evidence:([A-Za-z0-9\-]+)\]").ok());

/// Evidence ids cited as `[evidence:<id>]`, deduplicated in order.
pub fn extract_citations(text: &str) -> Vec<EvidenceId> {
    let Some(re) = CITATION.as_ref() else {
        return Vec::new();
    };
    let mut ids: Vec<EvidenceId> = Vec::new();
    for cap in re.captures_iter(text) {
        let id = EvidenceId::from(&cap[1]);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_fence_becomes_call() {
        let text = "Let me check.\n```tool\n{\"tool\": \"verified_price\", \"args\": {\"ticker\": \"600519.SH\"}, \"reasoning\": \"need close\"}\n```\n";
        match parse_agent_output(text) {
            AgentAction::CallTool(call) => {
                assert_eq!(call.tool_name, "verified_price");
                assert_eq!(call.get_string("ticker"), Some("600519.SH"));
                assert_eq!(call.reasoning.as_deref(), Some("need close"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_is_statement() {
        assert_eq!(
            parse_agent_output("  The close was 1710.5.  "),
            AgentAction::Speak("The close was 1710.5.".into())
        );
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let text = "```tool\n{tool: verified_price\n```";
        assert!(matches!(parse_agent_output(text), AgentAction::Malformed { .. }));

        let text = "```tool\n{\"tool\": \"  \"}\n```";
        assert!(matches!(parse_agent_output(text), AgentAction::Malformed { .. }));
    }

    #[test]
    fn test_extract_blocks_by_tag() {
        let text = "```audit\n{\"a\":1}\n```\n```tool\n{}\n```\n```audit\n{\"a\":2}\n```";
        let blocks = extract_fenced_blocks(text, "audit");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].contains("2"));
    }

    #[test]
    fn test_citations() {
        let ids = extract_citations("Close 1710 [evidence:ab-12] and [evidence:cd] again [evidence:ab-12]");
        assert_eq!(ids, vec![EvidenceId::from("ab-12"), EvidenceId::from("cd")]);
    }
}
