//! Completion payload: what the caller receives at a terminal state

use crate::{CaseRecord, Decision, TicketId};
use serde::{Deserialize, Serialize};

/// The structured result of a workflow run.
///
/// On the escalation path `final_response_to_customer` is absent: an
/// escalated ticket produces no customer response in this run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub ticket_id: TicketId,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response_to_customer: Option<String>,
    pub full_log: Vec<String>,
}

impl CompletionPayload {
    /// Assemble the payload from a record at a terminal state
    pub fn from_record(record: &CaseRecord) -> Self {
        Self {
            ticket_id: record.ticket_id(),
            customer_name: record.customer_name.clone(),
            decision: record.decision(),
            solution_score: record.solution_score,
            final_response_to_customer: record.final_response.clone(),
            full_log: record.logs().entries().to_vec(),
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.decision == Some(Decision::Escalate)
    }
}
