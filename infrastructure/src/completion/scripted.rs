//! Scripted [`CompletionService`] for demos and end-to-end tests.
//!
//! Requests are routed by the `Agent ID:` line every system prompt starts
//! with. Each agent has a queue of replies; once it runs dry the agent's
//! fallback (if any) is returned for every further request.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::trace;
use tribunal_application::ports::completion::{Completion, CompletionError, CompletionService};
use tribunal_domain::{Message, Role, ToolDefinition, ToolIntent};

/// One reply: plain text, or text with a native tool-call intent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedReply {
    Text(String),
    Structured {
        #[serde(default)]
        text: String,
        #[serde(default)]
        tool_intent: Option<ToolIntent>,
    },
}

impl From<ScriptedReply> for Completion {
    fn from(reply: ScriptedReply) -> Self {
        match reply {
            ScriptedReply::Text(text) => Completion::text(text),
            ScriptedReply::Structured { text, tool_intent } => Completion {
                text,
                tool_intent,
            },
        }
    }
}

/// JSON form of one agent's script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentScript {
    #[serde(default)]
    pub replies: Vec<ScriptedReply>,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Default)]
pub struct ScriptedCompletionService {
    queues: Mutex<HashMap<String, VecDeque<Completion>>>,
    fallbacks: HashMap<String, String>,
    served: Mutex<HashMap<String, usize>>,
}

impl ScriptedCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-agent scripts keyed by agent id.
    pub fn from_scripts(scripts: HashMap<String, AgentScript>) -> Self {
        let mut queues = HashMap::new();
        let mut fallbacks = HashMap::new();
        for (agent, script) in scripts {
            if let Some(fallback) = script.fallback {
                fallbacks.insert(agent.clone(), fallback);
            }
            queues.insert(
                agent,
                script.replies.into_iter().map(Completion::from).collect(),
            );
        }
        Self {
            queues: Mutex::new(queues),
            fallbacks,
            served: Mutex::new(HashMap::new()),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_replies(
        self,
        agent: impl Into<String>,
        replies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(agent.into())
            .or_default()
            .extend(replies.into_iter().map(|r| Completion::text(r)));
        self
    }

    pub fn with_fallback(mut self, agent: impl Into<String>, text: impl Into<String>) -> Self {
        self.fallbacks.insert(agent.into(), text.into());
        self
    }

    /// Completions served to `agent` so far.
    pub fn served(&self, agent: &str) -> usize {
        self.served
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(agent)
            .copied()
            .unwrap_or(0)
    }
}

/// Agent id from the first line of the system prompt.
pub fn agent_id_of(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .find(|m| m.role == Role::System)
        .and_then(|m| m.content.lines().next())
        .and_then(|line| line.strip_prefix("Agent ID:"))
        .map(str::trim)
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Completion, CompletionError> {
        let agent = agent_id_of(messages)
            .ok_or_else(|| CompletionError::RequestFailed("request has no agent id".into()))?;

        let next = self
            .queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(agent)
            .and_then(|q| q.pop_front());
        let completion = match next {
            Some(completion) => completion,
            None => self
                .fallbacks
                .get(agent)
                .map(|text| Completion::text(text.clone()))
                .ok_or_else(|| {
                    CompletionError::Unavailable(format!("script exhausted for agent '{}'", agent))
                })?,
        };

        *self
            .served
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(agent.to_string())
            .or_insert(0) += 1;
        trace!(agent, "Scripted completion served");
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(agent: &str) -> Vec<Message> {
        vec![
            Message::system(format!("Agent ID: {}\nRole: analyst", agent)),
            Message::user("go"),
        ]
    }

    #[tokio::test]
    async fn test_routes_by_agent_and_falls_back() {
        let service = ScriptedCompletionService::new()
            .with_replies("quant_bull", ["first", "second"])
            .with_fallback("quant_bull", "done");

        let bull = request("quant_bull");
        assert_eq!(service.complete(&bull, &[]).await.unwrap().text, "first");
        assert_eq!(service.complete(&bull, &[]).await.unwrap().text, "second");
        assert_eq!(service.complete(&bull, &[]).await.unwrap().text, "done");
        assert_eq!(service.served("quant_bull"), 3);

        assert!(matches!(
            service.complete(&request("risk_bear"), &[]).await,
            Err(CompletionError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_request_without_agent_id() {
        let service = ScriptedCompletionService::new();
        let messages = vec![Message::user("hello")];
        assert!(matches!(
            service.complete(&messages, &[]).await,
            Err(CompletionError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_from_json_scripts_with_tool_intent() {
        let scripts: HashMap<String, AgentScript> = serde_json::from_value(json!({
            "quant_bull": {
                "replies": [
                    {"text": "checking", "tool_intent": {"tool": "verified_price", "args": {"entity_code": "600519.SH"}}},
                    "Close was 1710.5."
                ]
            }
        }))
        .unwrap();
        let service = ScriptedCompletionService::from_scripts(scripts);

        let first = service.complete(&request("quant_bull"), &[]).await.unwrap();
        assert_eq!(first.tool_intent.unwrap().tool, "verified_price");
        let second = service.complete(&request("quant_bull"), &[]).await.unwrap();
        assert_eq!(second.text, "Close was 1710.5.");
        assert!(second.tool_intent.is_none());
    }
}
