//! Capability contract: providers, operations and their outputs
//!
//! Stages never talk to an external system directly. They name a
//! provider and an operation, hand over a read-only view of the case
//! record, and get back a [`CapabilityOutput`]. Any real backend has to
//! honor the same operation set and output shapes.

use crate::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a capability provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderId {
    /// General-purpose operations (parsing, formatting, scoring, templating)
    Common,
    /// Domain-specific operations (entities, CRM, knowledge base, ticketing)
    Atlas,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Common, ProviderId::Atlas];

    pub fn name(self) -> &'static str {
        match self {
            ProviderId::Common => "COMMON",
            ProviderId::Atlas => "ATLAS",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| WorkflowError::UnknownOperation {
                provider: s.to_string(),
                operation: String::new(),
            })
    }
}

/// A named capability operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // ── COMMON ──
    ParseRequestText,
    NormalizeFields,
    AddFlagsCalculations,
    SolutionEvaluation,
    ResponseGeneration,
    // ── ATLAS ──
    ExtractEntities,
    EnrichRecords,
    ClarifyQuestion,
    ExtractAnswer,
    KnowledgeBaseSearch,
    EscalationDecision,
    UpdateTicket,
    CloseTicket,
    ExecuteApiCalls,
    TriggerNotifications,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::ParseRequestText,
        Operation::NormalizeFields,
        Operation::AddFlagsCalculations,
        Operation::SolutionEvaluation,
        Operation::ResponseGeneration,
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

    /// Wire name of the operation
    pub fn name(self) -> &'static str {
        match self {
            Operation::ParseRequestText => "parse_request_text",
            Operation::NormalizeFields => "normalize_fields",
            Operation::AddFlagsCalculations => "add_flags_calculations",
            Operation::SolutionEvaluation => "solution_evaluation",
            Operation::ResponseGeneration => "response_generation",
            Operation::ExtractEntities => "extract_entities",
            Operation::EnrichRecords => "enrich_records",
            Operation::ClarifyQuestion => "clarify_question",
            Operation::ExtractAnswer => "extract_answer",
            Operation::KnowledgeBaseSearch => "knowledge_base_search",
            Operation::EscalationDecision => "escalation_decision",
            Operation::UpdateTicket => "update_ticket",
            Operation::CloseTicket => "close_ticket",
            Operation::ExecuteApiCalls => "execute_api_calls",
            Operation::TriggerNotifications => "trigger_notifications",
        }
    }

    /// The provider that owns this operation in the standard wiring
    pub fn home_provider(self) -> ProviderId {
        match self {
            Operation::ParseRequestText
            | Operation::NormalizeFields
            | Operation::AddFlagsCalculations
            | Operation::SolutionEvaluation
            | Operation::ResponseGeneration => ProviderId::Common,
            _ => ProviderId::Atlas,
        }
    }

    /// Operations owned by a provider in the standard wiring
    pub fn owned_by(provider: ProviderId) -> Vec<Operation> {
        Self::ALL
            .into_iter()
            .filter(|op| op.home_provider() == provider)
            .collect()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = WorkflowError;

    /// Accepts the wire name (`extract_entities`) or its kebab form
    /// (`extract-entities`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.name() == normalized)
            .ok_or_else(|| WorkflowError::UnknownOperation {
                provider: String::new(),
                operation: s.to_string(),
            })
    }
}

/// The result of a capability operation.
///
/// `Empty` is the null result: a total operation that had nothing to
/// return (e.g. no clarifying question needed).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityOutput {
    Integer(i64),
    Text(String),
    Mapping(Map<String, Value>),
    Empty,
}

impl CapabilityOutput {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Build a mapping output from key/value pairs
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Shape name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Mapping(_) => "mapping",
            Self::Empty => "empty",
        }
    }

    /// Expect a text result
    pub fn into_text(self, operation: Operation) -> WorkflowResult<String> {
        match self {
            Self::Text(s) => Ok(s),
            _ => Err(WorkflowError::UnexpectedOutput {
                operation,
                expected: "text",
            }),
        }
    }

    /// Expect text or the null result
    pub fn into_optional_text(self, operation: Operation) -> WorkflowResult<Option<String>> {
        match self {
            Self::Text(s) => Ok(Some(s)),
            Self::Empty => Ok(None),
            _ => Err(WorkflowError::UnexpectedOutput {
                operation,
                expected: "text or empty",
            }),
        }
    }

    /// Expect an integer result
    pub fn into_integer(self, operation: Operation) -> WorkflowResult<i64> {
        match self {
            Self::Integer(n) => Ok(n),
            _ => Err(WorkflowError::UnexpectedOutput {
                operation,
                expected: "integer",
            }),
        }
    }

    /// Expect a mapping result
    pub fn into_mapping(self, operation: Operation) -> WorkflowResult<Map<String, Value>> {
        match self {
            Self::Mapping(m) => Ok(m),
            _ => Err(WorkflowError::UnexpectedOutput {
                operation,
                expected: "mapping",
            }),
        }
    }

    /// Expect a mapping whose values are all strings
    pub fn into_string_mapping(
        self,
        operation: Operation,
    ) -> WorkflowResult<std::collections::BTreeMap<String, String>> {
        self.into_mapping(operation)?
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                _ => Err(WorkflowError::UnexpectedOutput {
                    operation,
                    expected: "mapping of strings",
                }),
            })
            .collect()
    }
}

impl std::fmt::Display for CapabilityOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Mapping(m) => write!(f, "{}", Value::Object(m.clone())),
            Self::Empty => write!(f, "None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wire_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(
            "extract-entities".parse::<Operation>().unwrap(),
            Operation::ExtractEntities
        );
    }

    #[test]
    fn test_unknown_operation_name() {
        let err = "summon_manager".parse::<Operation>().unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownOperation { .. }));
    }

    #[test]
    fn test_provider_ownership_partitions_operations() {
        let common = Operation::owned_by(ProviderId::Common);
        let atlas = Operation::owned_by(ProviderId::Atlas);
        assert_eq!(common.len(), 5);
        assert_eq!(atlas.len(), 10);
        assert!(common.iter().all(|op| !atlas.contains(op)));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("atlas".parse::<ProviderId>().unwrap(), ProviderId::Atlas);
        assert!("crm".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_output_accessors() {
        let op = Operation::ClarifyQuestion;
        assert_eq!(CapabilityOutput::Empty.into_optional_text(op).unwrap(), None);
        assert_eq!(
            CapabilityOutput::text("q?").into_optional_text(op).unwrap(),
            Some("q?".to_string())
        );
        assert!(matches!(
            CapabilityOutput::Integer(3).into_text(op),
            Err(WorkflowError::UnexpectedOutput { .. })
        ));
    }

    #[test]
    fn test_string_mapping_rejects_non_strings() {
        let out = CapabilityOutput::mapping([("count", 5)]);
        assert!(out.into_string_mapping(Operation::NormalizeFields).is_err());

        let out = CapabilityOutput::mapping([("sla_risk", "High")]);
        let m = out.into_string_mapping(Operation::AddFlagsCalculations).unwrap();
        assert_eq!(m.get("sla_risk").unwrap(), "High");
    }
}
