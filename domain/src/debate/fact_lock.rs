//! Fact anchoring
//!
//! Before round one the chairman fixes the subject's identity. The lock is
//! immutable for the session: tool calls about another entity are blocked,
//! and statements naming a different entity code are audit violations.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::intent::extract_fenced_blocks;
use crate::core::clock::Timestamp;
use crate::tool::entities::Params;
use crate::tool::params::entity_code;

/// Matches exchange-qualified codes such as `600519.SH` or `BRK.B`. The
/// body needs at least two characters so abbreviations like "U.S." pass.
static ENTITY_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[0-9A-Z]{2,10}\.[A-Z]{1,4}\b").ok());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactLock {
    /// Human-readable subject, e.g. "Kweichow Moutai"
    pub subject: String,
    /// Canonical entity code every tool call must use
    pub entity_code: String,
    /// Verified classification (industry, instrument type)
    #[serde(default)]
    pub classification: String,
    pub issued_at: Timestamp,
}

impl FactLock {
    pub fn new(
        subject: impl Into<String>,
        entity_code: impl Into<String>,
        classification: impl Into<String>,
        issued_at: Timestamp,
    ) -> Self {
        Self {
            subject: subject.into(),
            entity_code: entity_code.into(),
            classification: classification.into(),
            issued_at,
        }
    }

    /// Parse the chairman's `lock` fence. Empty fields are rejected.
    pub fn parse(text: &str, issued_at: Timestamp) -> Result<Self, String> {
        #[derive(Deserialize)]
        struct LockBlock {
            subject: String,
            entity_code: String,
            #[serde(default)]
            classification: String,
        }

        let block = extract_fenced_blocks(text, "lock")
            .into_iter()
            .next()
            .ok_or_else(|| "no lock block in chairman response".to_string())?;
        let parsed: LockBlock =
            serde_json::from_str(&block).map_err(|e| format!("invalid lock block: {}", e))?;
        if parsed.subject.trim().is_empty() || parsed.entity_code.trim().is_empty() {
            return Err("lock block needs subject and entity_code".to_string());
        }
        Ok(Self::new(
            parsed.subject.trim(),
            parsed.entity_code.trim(),
            parsed.classification.trim(),
            issued_at,
        ))
    }

    fn is_locked_entity(&self, code: &str) -> bool {
        code.eq_ignore_ascii_case(&self.entity_code)
    }

    /// A violation message when normalized tool parameters name another entity.
    pub fn check_params(&self, params: &Params) -> Option<String> {
        let code = entity_code(params)?;
        (!self.is_locked_entity(&code)).then(|| {
            format!(
                "tool call targets entity {} but the session is locked to {} ({})",
                code, self.entity_code, self.subject
            )
        })
    }

    /// Entity codes in `text` that differ from the locked one.
    pub fn foreign_codes(&self, text: &str) -> Vec<String> {
        let Some(re) = ENTITY_CODE.as_ref() else {
            return Vec::new();
        };
        let mut codes: Vec<String> = re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|c| !self.is_locked_entity(c))
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    /// Block of text injected into every system prompt.
    pub fn render(&self) -> String {
        let mut out = format!(
            "FACT LOCK (binding): subject = {}; entity code = {}",
            self.subject, self.entity_code
        );
        if !self.classification.is_empty() {
            out.push_str(&format!("; classification = {}", self.classification));
        }
        out
    }
}
