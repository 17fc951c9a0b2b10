//! CLI entrypoint for tribunal
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod demo;
mod output;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tribunal_infrastructure::{ConfigLoader, FileConfig};

use crate::cli::{Cli, Command, OutputFormat};
use crate::demo::{DemoOptions, Scenario};
use crate::output::ConsoleFormatter;
use crate::progress::ProgressReporter;

/// Install the stderr subscriber, plus a non-blocking file writer when
/// `[logging] file` is configured. The guard must outlive `main`'s work.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_file.and_then(|p| Some((p.parent()?, p.file_name()?))) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = ConfigLoader::load(cli.config.as_deref())?;
    let _guard = init_logging(cli.verbose, file_config.logging.file.as_deref());

    match cli.command {
        Command::Demo {
            scenario,
            rounds,
            transcript,
            output,
            quiet,
        } => {
            let config = file_config
                .to_tribunal_config()
                .context("Invalid configuration")?;
            let scenario = Scenario::load(&scenario)?;
            info!(session = %scenario.session_id, agents = scenario.agents.len(), "Starting tribunal demo");

            let options = DemoOptions {
                rounds,
                transcript: transcript.or_else(|| file_config.logging.transcript.clone()),
            };
            let run = if quiet || output == OutputFormat::Json {
                demo::run_quiet(scenario, config, options).await?
            } else {
                let progress = ProgressReporter::new(scenario.agents.len());
                demo::run(scenario, config, options, &progress).await?
            };

            let text = match output {
                OutputFormat::Full => ConsoleFormatter::format(&run.output, &run.stats),
                OutputFormat::Summary => ConsoleFormatter::format_summary(&run.output),
                OutputFormat::Json => ConsoleFormatter::format_json(&run.output, &run.stats),
            };
            println!("{}", text);
        }
        Command::Config { sources } => {
            print_config(&file_config, cli.config.as_deref(), sources)?;
        }
    }

    Ok(())
}

fn print_config(file_config: &FileConfig, explicit: Option<&Path>, sources: bool) -> Result<()> {
    if sources {
        println!("# Sources (lowest to highest priority)");
        for source in ConfigLoader::describe_sources(explicit) {
            println!("#   {}", source);
        }
        println!();
    }

    match file_config.to_tribunal_config() {
        Ok(_) => println!("# Configuration is valid"),
        Err(e) => println!("# Configuration is INVALID: {}", e),
    }
    println!(
        "{}",
        toml::to_string_pretty(file_config).context("Failed to render configuration")?
    );

    println!("# Default TTLs of catalog tools (seconds)");
    for (tool, secs) in demo::catalog_ttls() {
        println!("#   {:<22} {}", tool, secs);
    }
    Ok(())
}
