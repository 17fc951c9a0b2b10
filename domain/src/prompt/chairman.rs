//! Prompt templates for the chairman

use std::collections::BTreeMap;

use crate::debate::audit::AuditFinding;
use crate::debate::fact_lock::FactLock;

/// Agent id the chairman speaks as.
pub const CHAIRMAN_ID: &str = "chairman";

/// Templates for fact anchoring and arbitration
pub struct ChairmanPromptTemplate;

impl ChairmanPromptTemplate {
    pub fn system() -> String {
        format!(
            r#"Agent ID: {}
You are the chairman of a structured, evidence-based debate. You do not argue a side.
You fix the facts before the debate starts and audit every round for unsupported
claims, discipline violations and contradictions of the fact lock. Your corrections
are binding on all debaters."#,
            CHAIRMAN_ID
        )
    }

    /// Ask for the fact lock
    pub fn lock_prompt(topic: &str, subject: &str, entity_code: &str) -> String {
        format!(
            r#"Debate topic: {topic}
Declared subject: {subject}
Declared entity code: {entity_code}

Confirm the subject identity, its canonical entity code and its classification.
Answer with exactly one block:

```lock
{{"subject": "...", "entity_code": "...", "classification": "..."}}
```"#
        )
    }

    /// Ask for the round audit
    pub fn audit_prompt(
        round: usize,
        lock: Option<&FactLock>,
        team_summaries: &BTreeMap<String, String>,
        prechecks: &[AuditFinding],
    ) -> String {
        let mut prompt = format!("Audit of round {}.\n", round);
        if let Some(lock) = lock {
            prompt.push_str(&format!("{}\n", lock.render()));
        }

        prompt.push_str("\n## Team summaries\n");
        for (team, summary) in team_summaries {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", team, summary));
        }

        if !prechecks.is_empty() {
            prompt.push_str("\n## Automatic findings\n\n");
            for finding in prechecks {
                let who = finding
                    .agent_id
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string());
                prompt.push_str(&format!("- [{}] {}: {}\n", finding.kind, who, finding.detail));
            }
        }

        prompt.push_str(
            r#"
Review every statement. Answer with exactly one block:

```audit
{"correction": "binding instruction or null", "disputed_evidence": ["evidence id", ...], "findings": [{"agent": "agent id", "detail": "..."}]}
```"#,
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::agent::AgentId;
    use crate::debate::audit::FindingKind;

    #[test]
    fn test_audit_prompt_lists_teams_and_findings() {
        let mut summaries = BTreeMap::new();
        summaries.insert("bull".to_string(), "[a] up".to_string());
        summaries.insert("bear".to_string(), "[b] down".to_string());
        let findings = vec![AuditFinding::new(
            Some(AgentId::from("a")),
            FindingKind::UnsupportedClaim,
            "no evidence",
        )];
        let prompt = ChairmanPromptTemplate::audit_prompt(2, None, &summaries, &findings);
        assert!(prompt.contains("--- bull ---"));
        assert!(prompt.contains("[unsupported_claim] a: no evidence"));
        assert!(prompt.contains("```audit"));
    }

    #[test]
    fn test_system_identifies_chairman() {
        assert!(ChairmanPromptTemplate::system().starts_with("Agent ID: chairman"));
    }
}
