//! Console output for debate results

use colored::Colorize;
use serde_json::json;
use tribunal_application::{GatewayStatsSnapshot, RunDebateOutput};
use tribunal_domain::{BlockKind, CallOutcome, ToolCallRecord};

/// Formats debate results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Every turn, audit, the memory report and gateway statistics.
    pub fn format(output: &RunDebateOutput, stats: &GatewayStatsSnapshot) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Tribunal Debate"));
        out.push('\n');
        out.push_str(&format!(
            "{} {} ({})\n",
            "Subject:".cyan().bold(),
            output.fact_lock.subject,
            output.fact_lock.entity_code
        ));
        if !output.fact_lock.classification.is_empty() {
            out.push_str(&format!(
                "{} {}\n",
                "Classification:".cyan().bold(),
                output.fact_lock.classification
            ));
        }

        let rounds = output.turns.iter().map(|t| t.round).max().unwrap_or(0);
        let first = output.turns.iter().map(|t| t.round).min().unwrap_or(rounds);
        for round in first..=rounds {
            out.push_str(&Self::section_header(&format!("Round {}", round)));
            for turn in output.turns.iter().filter(|t| t.round == round) {
                let title = format!("── {} ({}) ──", turn.agent_id, turn.team);
                let title = if turn.forced {
                    format!("{} [forced]", title).red().bold()
                } else {
                    title.yellow().bold()
                };
                out.push_str(&format!("\n{}\n", title));
                for call in &turn.tool_calls {
                    out.push_str(&format!("  {}\n", Self::tool_call_line(call)));
                }
                out.push_str(&format!("{}\n", Self::indent(&turn.statement, "  ")));
            }

            if let Some(audit) = output.audits.iter().find(|a| a.round == round) {
                if audit.is_clean() {
                    out.push_str(&format!("\n{}\n", "Chairman: no findings".green()));
                } else {
                    out.push_str(&format!("\n{}\n", "Chairman findings:".yellow().bold()));
                    for finding in &audit.findings {
                        let who = finding
                            .agent_id
                            .as_ref()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        out.push_str(&format!("  * [{}] {}: {}\n", finding.kind, who, finding.detail));
                    }
                }
                if let Some(correction) = &audit.correction {
                    out.push_str(&format!("{} {}\n", "Correction:".magenta().bold(), correction.text));
                }
            }
        }

        out.push_str(&Self::section_header("Memory"));
        match &output.consolidation {
            Some(report) => out.push_str(&format!(
                "  promoted {} / evicted {} / skipped {} error-like ({} batch(es))\n",
                report.promoted, report.evicted, report.skipped_error_like, report.batches
            )),
            None => out.push_str(&format!("  {}\n", "consolidation failed".red())),
        }
        out.push_str(&format!(
            "  gateway: {} call(s), {} cache hit(s), {} adapter call(s), {} failure(s), {} slow\n",
            stats.calls,
            stats.cache_hits,
            stats.adapter_calls,
            stats.failures(),
            stats.slow_calls
        ));

        out.push_str(&Self::footer());
        out
    }

    /// Final statements only
    pub fn format_summary(output: &RunDebateOutput) -> String {
        let mut out = format!(
            "{}\n\n",
            format!("=== {} ({}) ===", output.fact_lock.subject, output.fact_lock.entity_code)
                .cyan()
                .bold()
        );
        for turn in output.final_statements() {
            out.push_str(&format!("{} {}\n\n", format!("{}:", turn.agent_id).bold(), turn.statement));
        }
        out
    }

    /// Format as JSON
    pub fn format_json(output: &RunDebateOutput, stats: &GatewayStatsSnapshot) -> String {
        let value = json!({
            "session_id": output.session_id,
            "fact_lock": output.fact_lock,
            "turns": output.turns,
            "audits": output.audits,
            "last_checkpoint": output.last_checkpoint,
            "consolidation": output.consolidation.as_ref().map(|r| json!({
                "evicted": r.evicted,
                "promoted": r.promoted,
                "skipped_error_like": r.skipped_error_like,
                "batches": r.batches,
            })),
            "gateway": stats,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn tool_call_line(call: &ToolCallRecord) -> String {
        let tool = call.resolved.as_deref().unwrap_or(&call.requested);
        match &call.outcome {
            CallOutcome::Observed {
                evidence_id,
                from_memory,
                empty,
            } => {
                let source = if *from_memory { "memory" } else { "gateway" };
                let line = format!("-> {} [{}] evidence:{}", tool, source, evidence_id);
                if *empty {
                    format!("{} (empty)", line).yellow().to_string()
                } else {
                    line.dimmed().to_string()
                }
            }
            CallOutcome::Failed { tier, code, .. } => {
                format!("x {} {} ({})", tool, code, tier).red().to_string()
            }
            CallOutcome::Blocked { kind, reason } => {
                let kind = match kind {
                    BlockKind::Loop => "loop",
                    BlockKind::FactLock => "fact lock",
                    BlockKind::NotEquipped => "not equipped",
                };
                format!("# {} blocked ({}): {}", call.requested, kind, reason)
                    .red()
                    .to_string()
            }
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
