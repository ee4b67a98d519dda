//! Workflow graph: an enum-keyed transition table
//!
//! Every stage has exactly one outgoing [`Transition`]. Most are
//! unconditional; the two branch points (after ASK and after DECIDE)
//! are plain functions of the case record that pick a [`Route`] from a
//! declared set of targets. Declaring the targets up front lets the
//! graph be validated before any run starts.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use ticketflow_types::{CaseRecord, Decision, StageId, WorkflowError, WorkflowResult};

/// Where control goes after a stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Route {
    Stage(StageId),
    End,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Stage(stage) => write!(f, "{}", stage),
            Route::End => write!(f, "END"),
        }
    }
}

/// Branch predicate: reads the record, picks the next route
pub type BranchFn = fn(&CaseRecord) -> WorkflowResult<Route>;

/// A conditional transition with its declared targets
#[derive(Clone)]
pub struct Branch {
    pub label: &'static str,
    pub targets: Vec<Route>,
    pub route: BranchFn,
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("label", &self.label)
            .field("targets", &self.targets)
            .finish()
    }
}

/// Outgoing transition of a stage
#[derive(Clone, Debug)]
pub enum Transition {
    Next(StageId),
    Branch(Branch),
    End,
}

impl Transition {
    /// Every route this transition can take
    pub fn targets(&self) -> Vec<Route> {
        match self {
            Transition::Next(stage) => vec![Route::Stage(*stage)],
            Transition::Branch(branch) => branch.targets.clone(),
            Transition::End => vec![Route::End],
        }
    }
}

/// The transition table walked by the executor
#[derive(Clone, Debug)]
pub struct WorkflowGraph {
    entry: StageId,
    transitions: BTreeMap<StageId, Transition>,
}

impl WorkflowGraph {
    /// An empty graph starting at `entry`
    pub fn new(entry: StageId) -> Self {
        Self {
            entry,
            transitions: BTreeMap::new(),
        }
    }

    /// The support ticket topology.
    ///
    /// ```text
    /// INTAKE → UNDERSTAND → PREPARE → ASK
    /// ASK ⇒ WAIT (question asked) | RETRIEVE
    /// WAIT → RETRIEVE → DECIDE
    /// DECIDE ⇒ END (ESCALATE) | UPDATE
    /// UPDATE → CREATE → DO → COMPLETE → END
    /// ```
    pub fn support_ticket() -> Self {
        use StageId::*;
        Self::new(Intake)
            .with_edge(Intake, Understand)
            .with_edge(Understand, Prepare)
            .with_edge(Prepare, Ask)
            .with_branch(
                Ask,
                "clarification",
                vec![Route::Stage(Wait), Route::Stage(Retrieve)],
                route_after_ask,
            )
            .with_edge(Wait, Retrieve)
            .with_edge(Retrieve, Decide)
            .with_branch(
                Decide,
                "escalation",
                vec![Route::End, Route::Stage(Update)],
                route_after_decide,
            )
            .with_edge(Update, Create)
            .with_edge(Create, Do)
            .with_edge(Do, Complete)
            .with_end(Complete)
    }

    pub fn with_edge(mut self, from: StageId, to: StageId) -> Self {
        self.transitions.insert(from, Transition::Next(to));
        self
    }

    pub fn with_branch(
        mut self,
        from: StageId,
        label: &'static str,
        targets: Vec<Route>,
        route: BranchFn,
    ) -> Self {
        self.transitions.insert(
            from,
            Transition::Branch(Branch {
                label,
                targets,
                route,
            }),
        );
        self
    }

    pub fn with_end(mut self, from: StageId) -> Self {
        self.transitions.insert(from, Transition::End);
        self
    }

    pub fn entry(&self) -> StageId {
        self.entry
    }

    pub fn transition(&self, stage: StageId) -> Option<&Transition> {
        self.transitions.get(&stage)
    }

    /// Stages with an outgoing transition, in stage order
    pub fn stages(&self) -> impl Iterator<Item = (StageId, &Transition)> {
        self.transitions.iter().map(|(s, t)| (*s, t))
    }

    /// Check the table is walkable.
    ///
    /// The entry and every target must have a transition, every stage
    /// must be reachable from the entry, and some route must end.
    pub fn validate(&self) -> WorkflowResult<()> {
        if !self.transitions.contains_key(&self.entry) {
            return Err(WorkflowError::InvalidGraph(format!(
                "entry stage {} has no transition",
                self.entry
            )));
        }

        for (stage, transition) in &self.transitions {
            let targets = transition.targets();
            if targets.is_empty() {
                return Err(WorkflowError::InvalidGraph(format!(
                    "branch at {} declares no targets",
                    stage
                )));
            }
            for target in targets {
                if let Route::Stage(next) = target {
                    if !self.transitions.contains_key(&next) {
                        return Err(WorkflowError::InvalidGraph(format!(
                            "{} leads to {}, which has no transition",
                            stage, next
                        )));
                    }
                }
            }
        }

        let reachable = self.reachable();
        if let Some(orphan) = self.transitions.keys().find(|s| !reachable.contains(s)) {
            return Err(WorkflowError::InvalidGraph(format!(
                "stage {} is unreachable from {}",
                orphan, self.entry
            )));
        }

        let terminates = self
            .transitions
            .values()
            .any(|t| t.targets().contains(&Route::End));
        if !terminates {
            return Err(WorkflowError::InvalidGraph(
                "no transition reaches END".into(),
            ));
        }

        Ok(())
    }

    fn reachable(&self) -> BTreeSet<StageId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([self.entry]);
        while let Some(stage) = queue.pop_front() {
            if !seen.insert(stage) {
                continue;
            }
            if let Some(transition) = self.transitions.get(&stage) {
                for target in transition.targets() {
                    if let Route::Stage(next) = target {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    /// Where to go after `stage` has run on `record`
    pub fn next(&self, stage: StageId, record: &CaseRecord) -> WorkflowResult<Route> {
        let transition = self.transitions.get(&stage).ok_or_else(|| {
            WorkflowError::InvalidGraph(format!("stage {} has no transition", stage))
        })?;

        match transition {
            Transition::Next(next) => Ok(Route::Stage(*next)),
            Transition::End => Ok(Route::End),
            Transition::Branch(branch) => {
                let route = (branch.route)(record)?;
                if !branch.targets.contains(&route) {
                    return Err(WorkflowError::InvalidGraph(format!(
                        "{} branch at {} chose undeclared route {}",
                        branch.label, stage, route
                    )));
                }
                tracing::debug!(
                    branch = branch.label,
                    from = %stage,
                    to = %route,
                    "Branch taken"
                );
                Ok(route)
            }
        }
    }
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::support_ticket()
    }
}

impl std::fmt::Display for WorkflowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "entry: {}", self.entry)?;
        for (stage, transition) in &self.transitions {
            match transition {
                Transition::Next(next) => writeln!(f, "  {} -> {}", stage, next)?,
                Transition::End => writeln!(f, "  {} -> END", stage)?,
                Transition::Branch(branch) => {
                    let targets: Vec<String> =
                        branch.targets.iter().map(Route::to_string).collect();
                    writeln!(
                        f,
                        "  {} => {} ({})",
                        stage,
                        targets.join(" | "),
                        branch.label
                    )?
                }
            }
        }
        Ok(())
    }
}

// ── Branch predicates ────────────────────────────────────────────────

/// WAIT when a clarifying question was asked, RETRIEVE otherwise
pub fn route_after_ask(record: &CaseRecord) -> WorkflowResult<Route> {
    tracing::debug!(ticket_id = %record.ticket_id(), "Checking if a question was asked");
    Ok(match record.clarifying_question {
        Some(_) => Route::Stage(StageId::Wait),
        None => Route::Stage(StageId::Retrieve),
    })
}

/// END on escalation, UPDATE on resolution
pub fn route_after_decide(record: &CaseRecord) -> WorkflowResult<Route> {
    tracing::debug!(ticket_id = %record.ticket_id(), "Checking escalation decision");
    match record.decision() {
        Some(Decision::Escalate) => Ok(Route::End),
        Some(Decision::Resolve) => Ok(Route::Stage(StageId::Update)),
        None => Err(WorkflowError::precondition(
            StageId::Decide,
            "`decision` has not been produced",
        )),
    }
}
