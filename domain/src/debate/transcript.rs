//! Append-only debate history.
//!
//! Concurrent turns append in completion order; only each agent's own
//! entries are causally ordered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::agent::AgentId;
use super::audit::Correction;
use super::fact_lock::FactLock;
use super::turn::TurnRecord;
use crate::evidence::entities::EvidenceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TranscriptEntry {
    FactLock(FactLock),
    Statement {
        agent_id: AgentId,
        team: String,
        round: usize,
        text: String,
        evidence_ids: Vec<EvidenceId>,
        forced: bool,
    },
    Correction(Correction),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateTranscript {
    entries: Vec<TranscriptEntry>,
}

impl DebateTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn push_turn(&mut self, turn: &TurnRecord) {
        self.entries.push(TranscriptEntry::Statement {
            agent_id: turn.agent_id.clone(),
            team: turn.team.clone(),
            round: turn.round,
            text: turn.statement.clone(),
            evidence_ids: turn.evidence_ids(),
            forced: turn.forced,
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn corrections(&self) -> impl Iterator<Item = &Correction> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::Correction(c) => Some(c),
            _ => None,
        })
    }

    /// Every evidence id cited so far, deduplicated in first-cited order.
    pub fn cited_evidence(&self) -> Vec<EvidenceId> {
        let mut ids: Vec<EvidenceId> = Vec::new();
        for entry in &self.entries {
            if let TranscriptEntry::Statement { evidence_ids, .. } = entry {
                for id in evidence_ids {
                    if !ids.contains(id) {
                        ids.push(id.clone());
                    }
                }
            }
        }
        ids
    }

    /// Statements of one round grouped by team.
    pub fn team_summaries(&self, round: usize) -> BTreeMap<String, String> {
        let mut teams: BTreeMap<String, String> = BTreeMap::new();
        for entry in &self.entries {
            if let TranscriptEntry::Statement {
                agent_id,
                team,
                round: r,
                text,
                ..
            } = entry
                && *r == round
            {
                let summary = teams.entry(team.clone()).or_default();
                if !summary.is_empty() {
                    summary.push('\n');
                }
                summary.push_str(&format!("[{}] {}", agent_id, text));
            }
        }
        teams
    }

    /// The last `max_entries` entries as prompt text.
    pub fn render_recent(&self, max_entries: usize) -> String {
        let start = self.entries.len().saturating_sub(max_entries);
        self.entries[start..]
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_entry(entry: &TranscriptEntry) -> String {
    match entry {
        TranscriptEntry::FactLock(lock) => lock.render(),
        TranscriptEntry::Statement {
            agent_id,
            team,
            round,
            text,
            ..
        } => format!("R{} {} ({}): {}", round, agent_id, team, text),
        TranscriptEntry::Correction(c) => format!("CHAIRMAN CORRECTION (round {}): {}", c.round, c.text),
    }
}
