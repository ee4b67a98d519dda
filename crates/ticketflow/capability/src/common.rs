//! COMMON provider: general-purpose operations

use crate::provider::CapabilityProvider;
use crate::scoring::ScoreSource;
use std::ops::RangeInclusive;
use std::sync::Arc;
use ticketflow_types::{
    CapabilityOutput, CaseRecord, Operation, ProviderId, WorkflowError, WorkflowResult,
};

const OPERATIONS: [Operation; 5] = [
    Operation::ParseRequestText,
    Operation::NormalizeFields,
    Operation::AddFlagsCalculations,
    Operation::SolutionEvaluation,
    Operation::ResponseGeneration,
];

/// Formats a ticket number into the fixed-width ticket code, e.g. `TCKT-0054321`
pub fn ticket_code(ticket_id: u64) -> String {
    format!("TCKT-{:07}", ticket_id)
}

/// General-purpose operations: text echo, field normalization, flags,
/// solution scoring and response templating
#[derive(Clone)]
pub struct CommonProvider {
    scores: Arc<dyn ScoreSource>,
    score_range: RangeInclusive<u32>,
}

impl CommonProvider {
    pub fn new(scores: impl ScoreSource + 'static, score_range: RangeInclusive<u32>) -> Self {
        Self {
            scores: Arc::new(scores),
            score_range,
        }
    }

    pub fn with_shared_source(scores: Arc<dyn ScoreSource>, score_range: RangeInclusive<u32>) -> Self {
        Self {
            scores,
            score_range,
        }
    }

    pub fn score_range(&self) -> &RangeInclusive<u32> {
        &self.score_range
    }

    fn response(record: &CaseRecord) -> String {
        let customer = if record.customer_name.is_empty() {
            "Customer"
        } else {
            record.customer_name.as_str()
        };
        let retrieved = record
            .retrieved_data
            .as_deref()
            .unwrap_or("No specific information was found.");
        format!(
            "Hello {},\n\nRegarding your ticket #{}, our system suggests the following: {} \
             This issue has now been marked as resolved.\n\nThank you for contacting us.",
            customer,
            record.ticket_id(),
            retrieved
        )
    }
}

impl std::fmt::Debug for CommonProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonProvider")
            .field("score_range", &self.score_range)
            .finish_non_exhaustive()
    }
}

impl CapabilityProvider for CommonProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Common
    }

    fn operations(&self) -> &[Operation] {
        &OPERATIONS
    }

    fn invoke(
        &self,
        operation: Operation,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        let output = match operation {
            Operation::ParseRequestText => CapabilityOutput::text(record.query.clone()),
            Operation::NormalizeFields => CapabilityOutput::mapping([(
                "normalized_ticket_id",
                ticket_code(record.ticket_id().value()),
            )]),
            Operation::AddFlagsCalculations => {
                let risk = if record.is_high_priority() { "High" } else { "Normal" };
                CapabilityOutput::mapping([("sla_risk", risk)])
            }
            Operation::SolutionEvaluation => {
                if self.score_range.is_empty() {
                    return Err(WorkflowError::InvalidConfig(format!(
                        "empty score range {:?}",
                        self.score_range
                    )));
                }
                let score = self.scores.draw(self.score_range.clone(), record);
                CapabilityOutput::Integer(i64::from(score))
            }
            Operation::ResponseGeneration => CapabilityOutput::text(Self::response(record)),
            other => return Err(WorkflowError::unknown_operation(self.id(), other)),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::FixedScore;
    use ticketflow_types::SeedRecord;

    fn provider() -> CommonProvider {
        CommonProvider::new(FixedScore::new(93), 90..=100)
    }

    fn record() -> CaseRecord {
        CaseRecord::from_seed(SeedRecord::sample()).unwrap()
    }

    #[test]
    fn test_parse_echoes_query() {
        let out = provider()
            .invoke(Operation::ParseRequestText, &record())
            .unwrap();
        assert_eq!(
            out,
            CapabilityOutput::text("My subscription for Product B is not working.")
        );
    }

    #[test]
    fn test_ticket_code_is_fixed_width() {
        assert_eq!(ticket_code(54321), "TCKT-0054321");
        assert_eq!(ticket_code(7), "TCKT-0000007");
        assert_eq!(ticket_code(123456789), "TCKT-123456789");

        let out = provider()
            .invoke(Operation::NormalizeFields, &record())
            .unwrap()
            .into_string_mapping(Operation::NormalizeFields)
            .unwrap();
        assert_eq!(out["normalized_ticket_id"], "TCKT-0054321");
    }

    #[test]
    fn test_flags_follow_priority() {
        let mut r = record();
        let flags = |r: &CaseRecord| {
            provider()
                .invoke(Operation::AddFlagsCalculations, r)
                .unwrap()
                .into_string_mapping(Operation::AddFlagsCalculations)
                .unwrap()["sla_risk"]
                .clone()
        };
        assert_eq!(flags(&r), "High");
        r.priority = "low".into();
        assert_eq!(flags(&r), "Normal");
        r.priority = "hIgH".into();
        assert_eq!(flags(&r), "High");
    }

    #[test]
    fn test_scoring_uses_injected_source() {
        let out = provider()
            .invoke(Operation::SolutionEvaluation, &record())
            .unwrap();
        assert_eq!(out, CapabilityOutput::Integer(93));
    }

    #[test]
    #[allow(clippy::reversed_empty_ranges)]
    fn test_empty_score_range_is_an_error() {
        let provider = CommonProvider::new(FixedScore::new(95), 100..=90);
        let err = provider
            .invoke(Operation::SolutionEvaluation, &record())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidConfig(_)));
    }

    #[test]
    fn test_response_template() {
        let mut r = record();
        r.retrieved_data = Some("KB Article 201: Troubleshooting steps for Product B.".into());
        let text = provider()
            .invoke(Operation::ResponseGeneration, &r)
            .unwrap()
            .into_text(Operation::ResponseGeneration)
            .unwrap();
        assert!(text.starts_with("Hello Jane Smith,"));
        assert!(text.contains("ticket #54321"));
        assert!(text.contains("KB Article 201"));
    }

    #[test]
    fn test_response_fallbacks() {
        let mut r = record();
        r.customer_name.clear();
        let text = provider()
            .invoke(Operation::ResponseGeneration, &r)
            .unwrap()
            .into_text(Operation::ResponseGeneration)
            .unwrap();
        assert!(text.starts_with("Hello Customer,"));
        assert!(text.contains("No specific information was found."));
    }

    #[test]
    fn test_rejects_foreign_operation() {
        let err = provider()
            .invoke(Operation::EnrichRecords, &record())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownOperation { .. }));
        assert!(!provider().supports(Operation::EnrichRecords));
    }
}
