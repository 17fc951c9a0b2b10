//! Command-line definition

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tribunal")]
#[command(author, version, about = "Evidence-grounded multi-agent debates")]
#[command(long_about = r#"
Tribunal runs a debate between tool-using agents under a chairman. Every
claim must trace back to a verified tool result: tool calls go through a
gateway that normalizes, guards and caches them, results are verified
before they are trusted, and verified results live in a two-tier memory.

Configuration is merged from (lowest to highest priority):
1. Built-in defaults
2. ~/.config/tribunal/config.toml   Global config
3. ./tribunal.toml                  Project-level config
4. --config <path>                  Explicit config file
5. TRIBUNAL_* environment variables (e.g. TRIBUNAL_DEBATE__ROUNDS=3)

Example:
  tribunal demo demos/basic_debate.json
  tribunal -vv demo demos/basic_debate.json --output json
  tribunal config --sources
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scripted debate scenario against fixture tools
    Demo {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Override the number of rounds
        #[arg(long)]
        rounds: Option<usize>,

        /// Write the JSONL transcript here (overrides [logging] transcript)
        #[arg(long, value_name = "PATH")]
        transcript: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,

        /// Suppress progress indicators
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the merged configuration
    Config {
        /// List the configuration sources that were considered
        #[arg(long)]
        sources: bool,
    },
}

/// How the debate result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every turn, audit and the memory report
    Full,
    /// Final statements only
    Summary,
    /// Machine-readable JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_args() {
        let cli = Cli::parse_from([
            "tribunal", "-vv", "demo", "demos/basic_debate.json", "--rounds", "3", "-o", "json",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Demo {
                scenario,
                rounds,
                output,
                quiet,
                ..
            } => {
                assert_eq!(scenario, PathBuf::from("demos/basic_debate.json"));
                assert_eq!(rounds, Some(3));
                assert_eq!(output, OutputFormat::Json);
                assert!(!quiet);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["tribunal", "config", "--config", "custom.toml", "--sources"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Command::Config { sources: true }));
    }
}
