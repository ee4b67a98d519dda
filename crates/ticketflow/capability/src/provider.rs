//! The capability provider seam

use ticketflow_types::{CapabilityOutput, CaseRecord, Operation, ProviderId, WorkflowResult};

/// An external collaborator exposing a fixed set of named operations.
///
/// Providers receive the record by shared reference and return a value;
/// they never write to the record. Implementations must be `Send + Sync`
/// so independent runs can share one router.
pub trait CapabilityProvider: Send + Sync {
    /// Identifier this provider is registered under
    fn id(&self) -> ProviderId;

    /// Operations this provider answers
    fn operations(&self) -> &[Operation];

    /// Answer an operation against the current record
    fn invoke(&self, operation: Operation, record: &CaseRecord)
        -> WorkflowResult<CapabilityOutput>;

    /// Whether `operation` is registered on this provider
    fn supports(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }
}
