//! Ticketflow CLI - run support tickets through the staged workflow
//!
//! This CLI lets operators and developers:
//! - Run a single ticket and inspect its payload, audit log and record
//! - Run a batch of tickets concurrently
//! - Print the workflow's transition table

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod commands;
pub mod config;
mod error;
pub mod output;

use commands::{batch, graph, run};
pub use error::{CliError, CliResult};

/// Ticketflow CLI application
#[derive(Parser, Debug)]
#[command(name = "ticketflow")]
#[command(about = "Ticketflow - staged support-ticket workflow", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TICKETFLOW_CONFIG", global = true)]
    config: Option<String>,

    /// Output format (pretty, json, yaml)
    #[arg(short, long, default_value = "pretty", global = true)]
    output: output::OutputFormat,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "TICKETFLOW_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one ticket through the workflow
    Run(run::RunArgs),

    /// Run a JSON array of tickets concurrently
    Batch(batch::BatchArgs),

    /// Show the workflow transition table
    Graph,
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Run(args) => {
            let config = config::load(cli.config.as_deref())?;
            print(&run::execute(args, config, cli.output)?);
            Ok(())
        }
        Commands::Batch(args) => {
            let config = config::load(cli.config.as_deref())?;
            let report = batch::execute(args, config, cli.output).await?;
            print(&report.text);
            report.into_result()
        }
        Commands::Graph => {
            print(&graph::execute(cli.output)?);
            Ok(())
        }
    }
}

fn print(text: &str) {
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}

/// Logs go to stderr so stdout carries only command output
fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    // A subscriber may already be installed when embedded or under test
    let _ = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "ticketflow",
            "run",
            "--score",
            "88",
            "--show-record",
            "-o",
            "json",
        ]);
        assert_eq!(cli.output, output::OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.score, Some(88));
                assert!(args.show_record);
                assert!(args.seed.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::parse_from(["ticketflow", "--json-logs", "batch", "seeds.json"]);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Batch(_)));
    }

    #[tokio::test]
    async fn test_graph_command_runs() {
        run_with_args(["ticketflow", "graph"]).await.unwrap();
    }
}
