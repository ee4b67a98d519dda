//! `ticketflow graph`: print the transition table

use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use serde::Serialize;
use ticketflow_engine::{Route, Transition, WorkflowGraph};

#[derive(Serialize)]
struct TransitionView {
    ordinal: usize,
    stage: &'static str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'static str>,
    targets: Vec<String>,
}

/// Execute `graph` and return the rendered output
pub fn execute(format: OutputFormat) -> CliResult<String> {
    let graph = WorkflowGraph::support_ticket();
    if format == OutputFormat::Pretty {
        return Ok(graph.to_string());
    }

    let view: Vec<TransitionView> = graph
        .stages()
        .map(|(stage, transition)| {
            let (kind, branch) = match transition {
                Transition::Next(_) => ("next", None),
                Transition::Branch(b) => ("branch", Some(b.label)),
                Transition::End => ("end", None),
            };
            TransitionView {
                ordinal: stage.ordinal(),
                stage: stage.name(),
                kind,
                branch,
                targets: transition.targets().iter().map(Route::to_string).collect(),
            }
        })
        .collect();
    output::structured(&view, format)
}
