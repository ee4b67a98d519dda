//! ATLAS provider: domain-specific operations
//!
//! Entity extraction, CRM enrichment, clarification, knowledge-base
//! search, and the ticketing/notification calls made at the end of a
//! run. Every operation is a pure function of the record it is given.

use crate::provider::CapabilityProvider;
use regex::Regex;
use std::sync::OnceLock;
use ticketflow_types::{
    CapabilityOutput, CaseRecord, Operation, ProviderId, WorkflowError, WorkflowResult,
    PRODUCT_ENTITY,
};

const OPERATIONS: [Operation; 10] = [
    Operation::ExtractEntities,
    Operation::EnrichRecords,
    Operation::ClarifyQuestion,
    Operation::ExtractAnswer,
    Operation::KnowledgeBaseSearch,
    Operation::EscalationDecision,
    Operation::UpdateTicket,
    Operation::CloseTicket,
    Operation::ExecuteApiCalls,
    Operation::TriggerNotifications,
];

/// Question asked when the query names no product
pub const PRODUCT_QUESTION: &str =
    "It seems a product was not mentioned. Could you please specify which product this query is about?";

fn product_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)product (\w+)").expect("static pattern compiles"))
}

/// First `product <word>` token in `query`, matched case-insensitively
pub fn extract_product(query: &str) -> Option<&str> {
    product_pattern()
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Domain-specific operations over the case record
#[derive(Clone, Debug, Default)]
pub struct AtlasProvider;

impl AtlasProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityProvider for AtlasProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Atlas
    }

    fn operations(&self) -> &[Operation] {
        &OPERATIONS
    }

    fn invoke(
        &self,
        operation: Operation,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        let ticket = record.ticket_id();
        let output = match operation {
            Operation::ExtractEntities => match extract_product(&record.query) {
                Some(product) => CapabilityOutput::mapping([(PRODUCT_ENTITY, product)]),
                None => CapabilityOutput::Mapping(Default::default()),
            },
            Operation::EnrichRecords => {
                let (sla, count) = if record.email.contains("jane") {
                    ("Gold", 5)
                } else {
                    ("Standard", 1)
                };
                CapabilityOutput::mapping([
                    ("sla", serde_json::Value::from(sla)),
                    ("historical_ticket_count", serde_json::Value::from(count)),
                ])
            }
            Operation::ClarifyQuestion => match record.product() {
                Some(_) => CapabilityOutput::Empty,
                None => CapabilityOutput::text(PRODUCT_QUESTION),
            },
            Operation::ExtractAnswer => {
                CapabilityOutput::text(record.user_answer.clone().unwrap_or_default())
            }
            Operation::KnowledgeBaseSearch => match record.product() {
                Some(product) => CapabilityOutput::text(format!(
                    "KB Article 201: Troubleshooting steps for Product {}.",
                    product
                )),
                None => CapabilityOutput::text(
                    "KB Article 101: General FAQ and support contact information.",
                ),
            },
            Operation::EscalationDecision => CapabilityOutput::text(format!(
                "Ticket {} assigned to Human Agent Tier 2.",
                ticket
            )),
            Operation::UpdateTicket => CapabilityOutput::text(format!(
                "Success: Ticket {} status updated to 'Resolved'.",
                ticket
            )),
            Operation::CloseTicket => {
                CapabilityOutput::text(format!("Success: Ticket {} has been closed.", ticket))
            }
            Operation::ExecuteApiCalls => CapabilityOutput::text(format!(
                "API Call Success: CRM record for ticket {} updated.",
                ticket
            )),
            Operation::TriggerNotifications => CapabilityOutput::text(format!(
                "Notification Success: Final response sent to {}.",
                record.email
            )),
            other => return Err(WorkflowError::unknown_operation(self.id(), other)),
        };
        Ok(output)
    }
}
