//! Subcommand implementations

pub mod batch;
pub mod graph;
pub mod run;

use crate::error::CliResult;
use std::path::Path;
use ticketflow_capability::FixedScore;
use ticketflow_engine::{WorkflowConfig, WorkflowExecutor};

/// Build an executor, forcing the solution score when `score` is given
pub fn executor(config: WorkflowConfig, score: Option<u32>) -> CliResult<WorkflowExecutor> {
    let mut builder = WorkflowExecutor::builder().with_config(config);
    if let Some(score) = score {
        builder = builder.with_score_source(FixedScore::new(score));
    }
    Ok(builder.build()?)
}

/// Read a JSON document from `path`
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
