//! Prompt templates for debaters

use crate::debate::agent::DebateAgent;
use crate::debate::audit::Correction;
use crate::debate::fact_lock::FactLock;
use crate::evidence::entities::EvidenceId;
use crate::memory::working::Freshness;
use crate::tool::entities::ToolDefinition;
use crate::tool::value_objects::{ErrorTier, ToolError};
use crate::util::json_preview;

const OBSERVATION_PREVIEW_BYTES: usize = 2_000;

/// Templates for debater prompts
pub struct DebatePromptTemplate;

impl DebatePromptTemplate {
    /// System prompt for a debater
    pub fn agent_system(
        agent: &DebateAgent,
        tools: &[&ToolDefinition],
        lock: Option<&FactLock>,
        corrections: &[&Correction],
    ) -> String {
        let tool_descriptions = tools
            .iter()
            .map(|t| {
                let params = t
                    .parameters
                    .iter()
                    .map(|p| {
                        let required = if p.required { " (required)" } else { "" };
                        format!("    - {} ({}): {}{}", p.name, p.param_type.as_str(), p.description, required)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("- **{}**: {}\n  Parameters:\n{}", t.name, t.description, params)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let lock_section = lock
            .map(|l| format!("\n## Fact Lock\n\n{}\nNever query or argue about any other entity.\n", l.render()))
            .unwrap_or_default();

        let corrections_section = if corrections.is_empty() {
            String::new()
        } else {
            let lines = corrections
                .iter()
                .map(|c| format!("- (round {}) {}", c.round, c.text))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n## Binding Chairman Corrections\n\n{}\n", lines)
        };

        format!(
            r#"Agent ID: {id}
You are {name}, a {discipline} analyst on team "{team}" in a structured debate.
{persona}
## Equipped Tools

{tool_descriptions}

## How to Use Tools

To call a tool, output exactly one block and nothing after it:

```tool
{{
  "tool": "tool_name",
  "args": {{"param": "value"}},
  "reasoning": "why this data is needed"
}}
```

When you are ready, answer with your statement as plain text (no tool block).
{lock_section}{corrections_section}
## Rules

- Every figure you state must come from a tool observation in this debate.
- If a tool returns no data, say so. Never invent a substitute value.
- Stay within your discipline ({discipline})."#,
            id = agent.id,
            name = agent.name,
            discipline = agent.discipline,
            team = agent.team,
            persona = if agent.persona.is_empty() {
                String::new()
            } else {
                format!("{}\n", agent.persona)
            },
        )
    }

    /// Opening user prompt of a turn
    pub fn turn_prompt(topic: &str, round: usize, recent: &str, memory_notes: &[String]) -> String {
        let mut prompt = format!("Debate topic: {}\nRound {}.\n", topic, round);
        if !recent.is_empty() {
            prompt.push_str(&format!("\n## Debate so far\n\n{}\n", recent));
        }
        if !memory_notes.is_empty() {
            prompt.push_str("\n## Related long-term memory\n\n");
            for note in memory_notes {
                prompt.push_str(&format!("- {}\n", note));
            }
        }
        prompt.push_str("\nGather evidence with your tools, then give your statement.");
        prompt
    }

    /// Observation of a successful tool call
    pub fn observation(
        tool: &str,
        evidence_id: &EvidenceId,
        payload: &serde_json::Value,
        freshness: Option<&Freshness>,
        warnings: &[String],
    ) -> String {
        let mut text = format!(
            "OBSERVATION from {} [evidence:{}]\n{}",
            tool,
            evidence_id,
            json_preview(payload, OBSERVATION_PREVIEW_BYTES)
        );
        if let Some(warning) = freshness.and_then(|f| f.warning.as_ref()) {
            text.push_str(&format!("\nSTALENESS WARNING: {}", warning));
        }
        for warning in warnings {
            text.push_str(&format!("\nNOTE: {}", warning));
        }
        text
    }

    /// Observation of a failed tool call
    pub fn failure_observation(tool: &str, error: &ToolError) -> String {
        let guidance = match error.tier {
            ErrorTier::Recoverable => "Adjust the parameters or use another tool.",
            ErrorTier::Terminal => "This query has no answer. Do not repeat it; try a different tool or angle.",
            ErrorTier::Fatal => "This tool family is unavailable for the rest of the debate.",
        };
        format!(
            "TOOL FAILURE from {}: {}\n{}\nDo not fabricate the missing data.",
            tool, error, guidance
        )
    }

    /// Injected after an empty result set
    pub fn empty_data_warning(tool: &str) -> String {
        format!(
            "DATA HONESTY WARNING: {} returned an empty result set. There is no data for this \
             request. Do not describe, estimate or imply values for it; state that the data is \
             unavailable or try a different query.",
            tool
        )
    }

    /// Injected after a call was blocked
    pub fn blocked_observation(reason: &str) -> String {
        format!("CALL BLOCKED: {}", reason)
    }

    /// Injected after an unparseable tool block
    pub fn format_note(error: &str) -> String {
        format!(
            "FORMAT ERROR: your tool block could not be parsed ({}). Emit a single ```tool block \
             containing a JSON object with \"tool\" and \"args\", or answer with your statement.",
            error
        )
    }

    /// Final prompt once the step budget is exhausted
    pub fn force_final() -> &'static str {
        "STEP LIMIT REACHED. No more tool calls are possible. Give your final statement now, \
         using only the evidence already observed, and state clearly what could not be verified."
    }
}
