//! Console progress for debates

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use tribunal_application::DebateProgress;
use tribunal_domain::{AgentId, AuditReport};

/// Progress bar per round, advanced as agents finish their turns.
pub struct ProgressReporter {
    agents: usize,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new(agents: usize) -> Self {
        Self {
            agents,
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl DebateProgress for ProgressReporter {
    fn on_round_start(&self, round: usize, total_rounds: usize) {
        let pb = ProgressBar::new(self.agents as u64);
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {}/{}", round, total_rounds));
        pb.set_message("agents thinking...");
        *self.round_bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn on_turn_complete(&self, agent: &AgentId, _round: usize, forced: bool) {
        if let Some(pb) = self.round_bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let status = if forced {
                format!("{} {} (forced)", "!".yellow(), agent)
            } else {
                format!("{} {}", "v".green(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_audit(&self, report: &AuditReport) {
        if let Some(pb) = self.round_bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let verdict = if report.is_clean() {
                "audit clean".green().to_string()
            } else {
                format!("{} finding(s)", report.findings.len()).yellow().to_string()
            };
            pb.finish_with_message(verdict);
        }
    }

    fn on_tool_call(&self, agent: &AgentId, tool: &str, success: bool) {
        if let Some(pb) = self.round_bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let mark = if success { "->".cyan() } else { "x".red() };
            pb.set_message(format!("{} {} {}", mark, agent, tool));
        }
    }
}
