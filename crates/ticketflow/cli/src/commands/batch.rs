//! `ticketflow batch`: many tickets, run concurrently
//!
//! Each seed runs on tokio's blocking pool against one shared executor.
//! Results are reported in input order whatever order the runs finish.

use super::{executor, read_json};
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use ticketflow_engine::WorkflowConfig;
use ticketflow_types::{CompletionPayload, SeedRecord};

/// Arguments for `batch`
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file holding an array of seed records
    pub seeds: PathBuf,

    /// Force the solution score instead of drawing it
    #[arg(long)]
    pub score: Option<u32>,
}

/// Result of one seed in a batch
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<CompletionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rendered batch output and how many runs failed
#[derive(Debug)]
pub struct BatchReport {
    pub text: String,
    pub failed: usize,
    pub total: usize,
}

impl BatchReport {
    /// Turn failed runs into an error once the report has been shown
    pub fn into_result(self) -> CliResult<()> {
        if self.failed > 0 {
            return Err(CliError::BatchFailed {
                failed: self.failed,
                total: self.total,
            });
        }
        Ok(())
    }
}

/// Run every seed and collect the entries in input order
pub async fn run_all(
    seeds: Vec<SeedRecord>,
    config: WorkflowConfig,
    score: Option<u32>,
) -> CliResult<Vec<BatchEntry>> {
    let executor = Arc::new(executor(config, score)?);

    let handles: Vec<_> = seeds
        .into_iter()
        .map(|seed| {
            let executor = Arc::clone(&executor);
            tokio::task::spawn_blocking(move || executor.run(seed))
        })
        .collect();

    let mut entries = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let entry = match handle.await? {
            Ok(outcome) => BatchEntry {
                index,
                payload: Some(outcome.payload),
                error: None,
            },
            Err(e) => {
                tracing::warn!(index, error = %e, "Batch run failed");
                BatchEntry {
                    index,
                    payload: None,
                    error: Some(e.to_string()),
                }
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

/// Execute `batch`
pub async fn execute(
    args: BatchArgs,
    config: WorkflowConfig,
    format: OutputFormat,
) -> CliResult<BatchReport> {
    let seeds: Vec<SeedRecord> = read_json(&args.seeds)?;
    let total = seeds.len();
    tracing::info!(total, "Running batch");

    let entries = run_all(seeds, config, args.score).await?;
    let failed = entries.iter().filter(|e| e.error.is_some()).count();

    let text = match format {
        OutputFormat::Pretty => render_pretty(&entries),
        _ => output::structured(&entries, format)?,
    };
    Ok(BatchReport {
        text,
        failed,
        total,
    })
}

fn render_pretty(entries: &[BatchEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("[{}] ", entry.index));
        match (&entry.payload, &entry.error) {
            (Some(payload), _) => out.push_str(&output::pretty_payload(payload, None)),
            (None, Some(error)) => out.push_str(&format!("error: {}\n", error)),
            (None, None) => out.push('\n'),
        }
        out.push('\n');
    }
    out
}
