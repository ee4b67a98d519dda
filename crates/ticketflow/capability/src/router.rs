//! Capability router: the single dispatch point between stages and providers

use crate::atlas::AtlasProvider;
use crate::common::CommonProvider;
use crate::provider::CapabilityProvider;
use crate::scoring::ScoreSource;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use ticketflow_types::{
    CapabilityOutput, CaseRecord, Operation, ProviderId, WorkflowError, WorkflowResult,
};

/// Routes `(provider, operation)` pairs to registered providers
#[derive(Clone, Default)]
pub struct CapabilityRouter {
    providers: BTreeMap<ProviderId, Arc<dyn CapabilityProvider>>,
}

impl CapabilityRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard wiring: COMMON scoring from `scores`, and ATLAS
    pub fn standard(scores: impl ScoreSource + 'static, score_range: RangeInclusive<u32>) -> Self {
        let mut router = Self::new();
        router.register(CommonProvider::new(scores, score_range));
        router.register(AtlasProvider::new());
        router
    }

    /// Register a provider, replacing any provider with the same id
    pub fn register(&mut self, provider: impl CapabilityProvider + 'static) {
        self.register_shared(Arc::new(provider));
    }

    /// Register a provider the caller keeps a handle to (e.g. a test double)
    pub fn register_shared(&mut self, provider: Arc<dyn CapabilityProvider>) {
        let id = provider.id();
        if self.providers.insert(id, provider).is_some() {
            tracing::debug!(provider = %id, "Capability provider replaced");
        }
    }

    pub fn with_provider(mut self, provider: impl CapabilityProvider + 'static) -> Self {
        self.register(provider);
        self
    }

    /// Whether the pair is registered
    pub fn is_registered(&self, provider: ProviderId, operation: Operation) -> bool {
        self.providers
            .get(&provider)
            .is_some_and(|p| p.supports(operation))
    }

    /// All registered `(provider, operation)` pairs
    pub fn registered(&self) -> Vec<(ProviderId, Operation)> {
        self.providers
            .iter()
            .flat_map(|(id, p)| p.operations().iter().map(move |op| (*id, *op)))
            .collect()
    }

    /// Execute `operation` on `provider` against the record.
    ///
    /// Fails with `UnknownOperation` when the pair is not registered.
    pub fn dispatch(
        &self,
        provider: ProviderId,
        operation: Operation,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        let target = self
            .providers
            .get(&provider)
            .filter(|p| p.supports(operation))
            .ok_or_else(|| WorkflowError::unknown_operation(provider, operation))?;

        tracing::debug!(
            provider = %provider,
            operation = %operation,
            ticket_id = %record.ticket_id(),
            "Dispatching capability"
        );
        let output = target.invoke(operation, record)?;
        tracing::trace!(operation = %operation, kind = output.kind(), "Capability returned");
        Ok(output)
    }

    /// Dispatch by wire names, e.g. `("ATLAS", "extract_entities")`
    pub fn dispatch_named(
        &self,
        provider: &str,
        operation: &str,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        let unknown = || WorkflowError::UnknownOperation {
            provider: provider.to_string(),
            operation: operation.to_string(),
        };
        let provider_id: ProviderId = provider.parse().map_err(|_| unknown())?;
        let op: Operation = operation.parse().map_err(|_| unknown())?;
        self.dispatch(provider_id, op, record)
    }
}

impl std::fmt::Debug for CapabilityRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRouter")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
