//! Error types for the Ticketflow workflow

use crate::{Operation, ProviderId, StageId};

/// Errors that can occur while running a support workflow
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Seed record is missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Unknown operation: {provider}/{operation}")]
    UnknownOperation { provider: String, operation: String },

    #[error("Stage {stage} precondition violated: {precondition}")]
    PreconditionViolated {
        stage: StageId,
        precondition: String,
    },

    #[error("Operation {operation} returned unexpected output (expected {expected})")]
    UnexpectedOutput {
        operation: Operation,
        expected: &'static str,
    },

    #[error("Stage {stage} failed: {source}")]
    StageFailed {
        stage: StageId,
        #[source]
        source: Box<WorkflowError>,
    },

    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid workflow configuration: {0}")]
    InvalidConfig(String),
}

impl WorkflowError {
    /// Build an `UnknownOperation` from typed identifiers
    pub fn unknown_operation(provider: ProviderId, operation: Operation) -> Self {
        Self::UnknownOperation {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Build a `PreconditionViolated` for a stage
    pub fn precondition(stage: StageId, precondition: impl Into<String>) -> Self {
        Self::PreconditionViolated {
            stage,
            precondition: precondition.into(),
        }
    }

    /// Attach the stage name to an error raised while that stage ran.
    ///
    /// Errors that already name a stage are returned unchanged.
    pub fn in_stage(self, stage: StageId) -> Self {
        match self {
            Self::PreconditionViolated { .. } | Self::StageFailed { .. } => self,
            other => Self::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if any
    pub fn stage(&self) -> Option<StageId> {
        match self {
            Self::PreconditionViolated { stage, .. } | Self::StageFailed { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stage_wraps_router_errors() {
        let err = WorkflowError::unknown_operation(ProviderId::Common, Operation::ExtractEntities)
            .in_stage(StageId::Understand);
        assert_eq!(err.stage(), Some(StageId::Understand));
        assert!(err.to_string().contains("UNDERSTAND"));
        assert!(err.to_string().contains("COMMON/extract_entities"));
    }

    #[test]
    fn test_in_stage_keeps_precondition_stage() {
        let err = WorkflowError::precondition(StageId::Decide, "solution score missing")
            .in_stage(StageId::Update);
        assert_eq!(err.stage(), Some(StageId::Decide));
    }

    #[test]
    fn test_missing_field_has_no_stage() {
        let err = WorkflowError::MissingRequiredField { field: "ticket_id" };
        assert_eq!(err.stage(), None);
        assert_eq!(
            err.to_string(),
            "Seed record is missing required field: ticket_id"
        );
    }
}
