//! Per-turn repeated-call detection.

use std::collections::HashSet;

use crate::tool::entities::Params;
use crate::tool::params::inputs_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCheck {
    Fresh,
    /// Identical (tool, params) already requested this turn
    Repeated { warning: String },
}

/// Tracks (tool, normalized params) keys seen within one agent turn.
#[derive(Debug, Default)]
pub struct LoopGuard {
    seen: HashSet<String>,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call; a second identical call is reported as a loop.
    pub fn check(&mut self, tool: &str, params: &Params) -> LoopCheck {
        if self.seen.insert(inputs_hash(tool, params)) {
            LoopCheck::Fresh
        } else {
            LoopCheck::Repeated {
                warning: format!(
                    "LOOP WARNING: you already called '{}' with {} in this turn. \
                     The call was blocked. Use the observation you already have, \
                     try a different tool or parameters, or give your final statement.",
                    tool,
                    serde_json::Value::Object(params.clone())
                ),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
