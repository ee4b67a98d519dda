//! Output formatting for CLI

use crate::error::CliResult;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use ticketflow_engine::{RunOutcome, Terminal};
use ticketflow_types::CompletionPayload;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Pretty,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Serialize `value` in a machine format; `Pretty` falls back to JSON
pub fn structured<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Json | OutputFormat::Pretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Render the result of one run
pub fn outcome(outcome: &RunOutcome, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Pretty => Ok(pretty_payload(&outcome.payload, Some(outcome))),
        _ => structured(&outcome.payload, format),
    }
}

/// Human-readable payload summary
pub fn pretty_payload(payload: &CompletionPayload, outcome: Option<&RunOutcome>) -> String {
    let mut out = String::new();

    let title = format!("Ticket #{} ({})", payload.ticket_id, payload.customer_name);
    out.push_str(&format!("{}\n", title.bold()));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    let decision = match payload.decision {
        Some(d) if payload.is_escalated() => d.to_string().yellow().bold().to_string(),
        Some(d) => d.to_string().green().bold().to_string(),
        None => "-".dimmed().to_string(),
    };
    out.push_str(&format!("  Decision: {}\n", decision));

    let score = payload
        .solution_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".into());
    out.push_str(&format!("  Score:    {}\n", score));

    if let Some(outcome) = outcome {
        let terminal = match outcome.terminal {
            Terminal::Completed => "completed",
            Terminal::Escalated => "escalated to a human agent",
        };
        out.push_str(&format!("  Outcome:  {}\n", terminal));
        let path: Vec<&str> = outcome.path.iter().map(|s| s.name()).collect();
        out.push_str(&format!("  Path:     {}\n", path.join(" > ")));
        out.push_str(&format!("  Run:      {}\n", outcome.run_id.to_string().dimmed()));
    }

    if let Some(response) = &payload.final_response_to_customer {
        out.push_str(&format!("\n{}\n", "Response to customer".bold().cyan()));
        for line in response.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    out.push_str(&format!("\n{}\n", "Audit log".bold().cyan()));
    for entry in &payload.full_log {
        out.push_str(&format!("  {}\n", entry));
    }
    out
}
