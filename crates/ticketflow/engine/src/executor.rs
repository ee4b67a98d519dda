//! Workflow executor
//!
//! Walks the [`WorkflowGraph`] from its entry stage, running each stage
//! and evaluating branch predicates until a terminal route is reached.
//! The executor holds no per-run state, so one instance can serve many
//! concurrent runs.

use crate::answer::{AnswerSource, CannedAnswer};
use crate::config::WorkflowConfig;
use crate::graph::{Route, WorkflowGraph};
use crate::stages::StageRunner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketflow_capability::{
    AtlasProvider, CapabilityRouter, CommonProvider, EntropyScore, ScoreSource, SeededScore,
};
use ticketflow_types::{
    CaseRecord, CompletionPayload, Decision, SeedRecord, StageId, WorkflowError, WorkflowResult,
};

/// Unique identifier for one workflow run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// Resolved automatically; COMPLETE ran
    Completed,
    /// Handed to a human agent after DECIDE
    Escalated,
}

/// Everything a caller gets back from a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub terminal: Terminal,
    /// Stages in the order they ran
    pub path: Vec<StageId>,
    pub payload: CompletionPayload,
    pub record: CaseRecord,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    pub fn is_escalated(&self) -> bool {
        self.terminal == Terminal::Escalated
    }

    pub fn visited(&self, stage: StageId) -> bool {
        self.path.contains(&stage)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs support tickets through the workflow graph
pub struct WorkflowExecutor {
    config: WorkflowConfig,
    router: CapabilityRouter,
    answers: Arc<dyn AnswerSource>,
    graph: WorkflowGraph,
}

impl WorkflowExecutor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Executor with default configuration and the standard providers
    pub fn standard() -> WorkflowResult<Self> {
        Self::builder().build()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    /// Run one ticket to a terminal state.
    ///
    /// Missing seed fields are rejected before any stage runs. Errors
    /// abort the run; nothing is retried.
    pub fn run(&self, seed: SeedRecord) -> WorkflowResult<RunOutcome> {
        let run_id = RunId::generate();
        let started_at = Utc::now();

        let record = CaseRecord::from_seed(seed).inspect_err(|e| {
            tracing::warn!(run_id = %run_id, error = %e, "Seed rejected");
        })?;
        let ticket_id = record.ticket_id();
        tracing::info!(run_id = %run_id, ticket_id = %ticket_id, "Workflow run started");

        let (record, path) = self.walk(record).inspect_err(|e| {
            tracing::warn!(
                run_id = %run_id,
                ticket_id = %ticket_id,
                stage = ?e.stage(),
                error = %e,
                "Workflow run failed"
            );
        })?;

        let terminal = match record.decision() {
            Some(Decision::Escalate) => Terminal::Escalated,
            _ => Terminal::Completed,
        };
        let payload = CompletionPayload::from_record(&record);
        let finished_at = Utc::now();

        tracing::info!(
            run_id = %run_id,
            ticket_id = %ticket_id,
            terminal = ?terminal,
            stages = path.len(),
            "Workflow run finished"
        );

        Ok(RunOutcome {
            run_id,
            terminal,
            path,
            payload,
            record,
            started_at,
            finished_at,
        })
    }

    fn walk(&self, mut record: CaseRecord) -> WorkflowResult<(CaseRecord, Vec<StageId>)> {
        let runner = StageRunner::new(&self.router, self.answers.as_ref(), &self.config);
        // A run never needs more steps than there are stages
        let max_steps = self.graph.stages().count();
        let mut path = Vec::with_capacity(max_steps);
        let mut stage = self.graph.entry();

        loop {
            if path.len() >= max_steps {
                return Err(WorkflowError::InvalidGraph(format!(
                    "run exceeded {} steps at {}; the graph loops",
                    max_steps, stage
                )));
            }

            let logged = record.logs().len();
            record = runner.run(stage, record)?;
            if record.logs().len() <= logged {
                return Err(WorkflowError::precondition(
                    stage,
                    "stage appended no audit entry",
                ));
            }
            path.push(stage);

            match self.graph.next(stage, &record)? {
                Route::Stage(next) => stage = next,
                Route::End => break,
            }
        }

        Ok((record, path))
    }
}

impl std::fmt::Debug for WorkflowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutor")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Assembles a [`WorkflowExecutor`] from injected parts
#[derive(Default)]
pub struct ExecutorBuilder {
    config: WorkflowConfig,
    scores: Option<Arc<dyn ScoreSource>>,
    answers: Option<Arc<dyn AnswerSource>>,
    router: Option<CapabilityRouter>,
    graph: Option<WorkflowGraph>,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Score source for the standard COMMON provider.
    ///
    /// Ignored when a custom router is supplied.
    pub fn with_score_source(mut self, scores: impl ScoreSource + 'static) -> Self {
        self.scores = Some(Arc::new(scores));
        self
    }

    pub fn with_answer_source(mut self, answers: impl AnswerSource + 'static) -> Self {
        self.answers = Some(Arc::new(answers));
        self
    }

    /// Replace the standard provider wiring entirely
    pub fn with_router(mut self, router: CapabilityRouter) -> Self {
        self.router = Some(router);
        self
    }

    pub fn with_graph(mut self, graph: WorkflowGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Validate the configuration and graph, then build.
    ///
    /// Without an explicit score source, scoring is seeded when the
    /// config carries `score_seed` and drawn from entropy otherwise.
    pub fn build(self) -> WorkflowResult<WorkflowExecutor> {
        self.config.validate()?;

        let graph = self.graph.unwrap_or_else(WorkflowGraph::support_ticket);
        graph.validate()?;

        let router = match self.router {
            Some(router) => router,
            None => {
                let scores: Arc<dyn ScoreSource> = match (self.scores, self.config.score_seed) {
                    (Some(scores), _) => scores,
                    (None, Some(seed)) => Arc::new(SeededScore::new(seed)),
                    (None, None) => Arc::new(EntropyScore),
                };
                CapabilityRouter::new()
                    .with_provider(CommonProvider::with_shared_source(
                        scores,
                        self.config.score_range(),
                    ))
                    .with_provider(AtlasProvider::new())
            }
        };

        let answers = self.answers.unwrap_or_else(|| {
            Arc::new(CannedAnswer::new(self.config.clarification_answer.clone()))
        });

        tracing::debug!(
            threshold = self.config.escalation_threshold,
            score_floor = self.config.score_floor,
            score_ceiling = self.config.score_ceiling,
            seeded = self.config.score_seed.is_some(),
            "Workflow executor built"
        );

        Ok(WorkflowExecutor {
            config: self.config,
            router,
            answers,
            graph,
        })
    }
}
