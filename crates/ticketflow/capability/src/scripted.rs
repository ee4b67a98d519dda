//! Scripted provider: a deterministic test double
//!
//! Answers every registered operation with a canned output and keeps a
//! journal of the calls it received, so tests can assert exactly which
//! operations a run dispatched.

use crate::provider::CapabilityProvider;
use std::collections::BTreeMap;
use std::sync::Mutex;
use ticketflow_types::{
    CapabilityOutput, CaseRecord, Operation, ProviderId, TicketId, WorkflowError,
    WorkflowResult,
};

/// Canned-output provider with a call journal
#[derive(Debug)]
pub struct ScriptedProvider {
    id: ProviderId,
    operations: Vec<Operation>,
    outputs: BTreeMap<Operation, CapabilityOutput>,
    calls: Mutex<Vec<(Operation, TicketId)>>,
}

impl ScriptedProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            operations: Vec::new(),
            outputs: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register `operation` with a fixed answer
    pub fn with_output(mut self, operation: Operation, output: CapabilityOutput) -> Self {
        if !self.operations.contains(&operation) {
            self.operations.push(operation);
        }
        self.outputs.insert(operation, output);
        self
    }

    /// Operations received so far, in call order
    pub fn calls(&self) -> Vec<Operation> {
        self.journal().into_iter().map(|(op, _)| op).collect()
    }

    /// Number of times `operation` was invoked
    pub fn call_count(&self, operation: Operation) -> usize {
        self.journal().iter().filter(|(op, _)| *op == operation).count()
    }

    fn journal(&self) -> Vec<(Operation, TicketId)> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CapabilityProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn invoke(
        &self,
        operation: Operation,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        let output = self
            .outputs
            .get(&operation)
            .cloned()
            .ok_or_else(|| WorkflowError::unknown_operation(self.id, operation))?;

        let mut calls = match self.calls.lock() {
            Ok(calls) => calls,
            Err(poisoned) => poisoned.into_inner(),
        };
        calls.push((operation, record.ticket_id()));
        Ok(output)
    }
}
