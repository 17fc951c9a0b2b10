//! Debaters

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Analytical discipline a debater is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    /// Numbers only: prices, ratios, statements
    Quantitative,
    /// Business model, governance, industry
    Qualitative,
    Macro,
    Risk,
    #[default]
    Generalist,
}

impl Discipline {
    pub fn as_str(&self) -> &str {
        match self {
            Discipline::Quantitative => "quantitative",
            Discipline::Qualitative => "qualitative",
            Discipline::Macro => "macro",
            Discipline::Risk => "risk",
            Discipline::Generalist => "generalist",
        }
    }

    /// Phrases that signal a conclusion outside this discipline.
    pub fn out_of_scope_markers(&self) -> &'static [&'static str] {
        match self {
            Discipline::Quantitative => &[
                "management quality",
                "brand strength",
                "corporate culture",
                "moat",
                "market sentiment",
                "reputation",
            ],
            Discipline::Qualitative => &["price target", "fair value of", "intrinsic value of"],
            Discipline::Macro => &["management quality", "product quality"],
            Discipline::Risk | Discipline::Generalist => &[],
        }
    }

    /// First out-of-scope marker found in `text`, if any.
    pub fn violation_in(&self, text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        self.out_of_scope_markers()
            .iter()
            .copied()
            .find(|m| lower.contains(m))
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A debater: identity, team, discipline and tool allow-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateAgent {
    pub id: AgentId,
    pub name: String,
    /// Agents on the same team are summarized together for audit
    pub team: String,
    #[serde(default)]
    pub discipline: Discipline,
    /// Tool names this agent is equipped with
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub persona: String,
}

impl DebateAgent {
    pub fn new(id: impl Into<String>, team: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: AgentId::new(id),
            team: team.into(),
            discipline: Discipline::Generalist,
            tools: Vec::new(),
            persona: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn is_equipped_with(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}
