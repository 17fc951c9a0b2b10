//! Tool equipping
//!
//! Each agent holds an allow-list of tools. A request outside the list is
//! redirected to an equipped tool of the same category instead of failing:
//!
//! ```text
//! requested ──▶ alias resolution ──▶ equipped? ──yes──▶ Equipped::Direct
//!                                       │
//!                                       no ──▶ category ──▶ preferred equipped tool ──▶ Equipped::Redirected
//!                                                                     │
//!                                                                     none ──▶ Equipped::Unavailable
//! ```

use std::collections::HashMap;

use super::agent::DebateAgent;
use crate::tool::entities::{ToolCategory, ToolSpec};

/// Preference order per category, consulted before any other equipped
/// tool of that category.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    preferences: HashMap<ToolCategory, Vec<String>>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(
        mut self,
        category: ToolCategory,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.preferences
            .insert(category, tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn preferred(&self, category: ToolCategory) -> &[String] {
        self.preferences
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Equipped {
    Direct(String),
    Redirected { requested: String, to: String },
    Unavailable { requested: String, reason: String },
}

impl Equipped {
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Equipped::Direct(name) => Some(name),
            Equipped::Redirected { to, .. } => Some(to),
            Equipped::Unavailable { .. } => None,
        }
    }
}

pub struct EquipmentResolver<'a> {
    spec: &'a ToolSpec,
    table: &'a CategoryTable,
}

impl<'a> EquipmentResolver<'a> {
    pub fn new(spec: &'a ToolSpec, table: &'a CategoryTable) -> Self {
        Self { spec, table }
    }

    pub fn resolve(&self, agent: &DebateAgent, requested: &str) -> Equipped {
        let canonical = self.spec.resolve(requested);

        if let Some(name) = canonical
            && agent.is_equipped_with(name)
        {
            return Equipped::Direct(name.to_string());
        }

        let category = canonical
            .and_then(|name| self.spec.get(name))
            .map(|def| def.category)
            .unwrap_or_else(|| ToolCategory::infer_from_name(requested));

        if category == ToolCategory::Other {
            return Equipped::Unavailable {
                requested: requested.to_string(),
                reason: format!(
                    "tool '{}' is not equipped and has no known equivalent; equipped tools: {}",
                    requested,
                    agent.tools.join(", ")
                ),
            };
        }

        let preferred = self
            .table
            .preferred(category)
            .iter()
            .find(|name| agent.is_equipped_with(name));

        let same_category = || {
            agent
                .tools
                .iter()
                .find(|name| self.spec.get(name).is_some_and(|def| def.category == category))
        };

        match preferred.or_else(same_category) {
            Some(to) => Equipped::Redirected {
                requested: requested.to_string(),
                to: to.clone(),
            },
            None => Equipped::Unavailable {
                requested: requested.to_string(),
                reason: format!(
                    "no equipped {} tool for '{}'; equipped tools: {}",
                    category,
                    requested,
                    agent.tools.join(", ")
                ),
            },
        }
    }
}
