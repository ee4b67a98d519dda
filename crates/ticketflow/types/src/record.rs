//! The case record: the single state object of a workflow run
//!
//! A `CaseRecord` is built once from a [`SeedRecord`] at intake and then
//! handed from stage to stage by value. Identity fields are fixed at
//! construction. Derived fields start out absent and are written by the
//! stage that produces them; the write-once fields (`entities`,
//! `decision`) reject a second write.

use crate::{AuditLog, StageId, WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the product entity in [`CaseRecord::entities`]
pub const PRODUCT_ENTITY: &str = "product";

// ── Identifiers ──────────────────────────────────────────────────────

/// Ticket number assigned by the upstream ticketing system
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl TicketId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of the DECIDE stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Resolve,
    Escalate,
}

impl Decision {
    /// Route a solution score against the escalation threshold.
    /// A score equal to the threshold resolves.
    pub fn for_score(score: u32, threshold: u32) -> Self {
        if score < threshold {
            Decision::Escalate
        } else {
            Decision::Resolve
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Resolve => "RESOLVE",
            Decision::Escalate => "ESCALATE",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Seed ─────────────────────────────────────────────────────────────

/// Caller-supplied intake payload.
///
/// Every field is optional on the wire so that a missing field can be
/// reported by name instead of as a generic deserialization failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Entries logged before this run, if an upstream system kept any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

impl SeedRecord {
    pub fn new(
        ticket_id: u64,
        customer_name: impl Into<String>,
        email: impl Into<String>,
        query: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            customer_name: Some(customer_name.into()),
            email: Some(email.into()),
            query: Some(query.into()),
            priority: Some(priority.into()),
            logs: None,
        }
    }

    /// The sample ticket used by the demo run
    pub fn sample() -> Self {
        Self::new(
            54321,
            "Jane Smith",
            "jane.smith@example.com",
            "My subscription for Product B is not working.",
            "High",
        )
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = Some(logs);
        self
    }
}

fn required(value: Option<String>, field: &'static str) -> WorkflowResult<String> {
    value.ok_or(WorkflowError::MissingRequiredField { field })
}

// ── Case Record ──────────────────────────────────────────────────────

/// The mutable record threaded through every stage of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    ticket_id: TicketId,
    pub customer_name: String,
    pub email: String,
    pub query: String,
    pub priority: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entities: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_fields: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_records: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_flags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub clarifying_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,

    logs: AuditLog,
}

impl CaseRecord {
    /// Build a record from a seed, rejecting missing identity fields.
    ///
    /// `ticket_id` is checked first: nothing downstream can run without it.
    pub fn from_seed(seed: SeedRecord) -> WorkflowResult<Self> {
        let ticket_id = seed
            .ticket_id
            .map(TicketId)
            .ok_or(WorkflowError::MissingRequiredField { field: "ticket_id" })?;

        Ok(Self {
            ticket_id,
            customer_name: required(seed.customer_name, "customer_name")?,
            email: required(seed.email, "email")?,
            query: required(seed.query, "query")?,
            priority: required(seed.priority, "priority")?,
            parsed_text: None,
            entities: None,
            normalized_fields: None,
            enriched_records: None,
            calculated_flags: None,
            clarifying_question: None,
            user_answer: None,
            retrieved_data: None,
            solution_score: None,
            decision: None,
            final_response: None,
            logs: seed.logs.map(AuditLog::from_entries).unwrap_or_default(),
        })
    }

    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// Whether priority is "high", compared case-insensitively
    pub fn is_high_priority(&self) -> bool {
        self.priority.trim().eq_ignore_ascii_case("high")
    }

    // ── Entities (write-once) ──

    pub fn entities(&self) -> Option<&BTreeMap<String, String>> {
        self.entities.as_ref()
    }

    /// The extracted product entity, if the query named one
    pub fn product(&self) -> Option<&str> {
        self.entities
            .as_ref()
            .and_then(|e| e.get(PRODUCT_ENTITY))
            .map(String::as_str)
    }

    /// Store extracted entities. Entities are computed once per run.
    pub fn set_entities(
        &mut self,
        stage: StageId,
        entities: BTreeMap<String, String>,
    ) -> WorkflowResult<()> {
        if self.entities.is_some() {
            return Err(WorkflowError::precondition(
                stage,
                "entities already extracted for this record",
            ));
        }
        self.entities = Some(entities);
        Ok(())
    }

    // ── Decision (write-once) ──

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    /// Record the resolve/escalate decision. Set exactly once per run.
    pub fn set_decision(&mut self, stage: StageId, decision: Decision) -> WorkflowResult<()> {
        if let Some(existing) = self.decision {
            return Err(WorkflowError::precondition(
                stage,
                format!("decision already set to {}", existing),
            ));
        }
        self.decision = Some(decision);
        Ok(())
    }

    // ── Audit ──

    pub fn logs(&self) -> &AuditLog {
        &self.logs
    }

    pub fn log(&mut self, entry: impl Into<String>) {
        self.logs.append(entry);
    }

    // ── Preconditions ──

    /// Fetch an upstream field or fail the stage that needed it
    pub fn require<'a, T: ?Sized>(
        stage: StageId,
        field: &'static str,
        value: Option<&'a T>,
    ) -> WorkflowResult<&'a T> {
        value.ok_or_else(|| {
            WorkflowError::precondition(stage, format!("`{}` has not been produced", field))
        })
    }
}
