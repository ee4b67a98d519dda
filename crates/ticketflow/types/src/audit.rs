//! Audit trail: the ordered narration of a workflow run
//!
//! The audit log is append-only. Entries are never reordered, removed
//! or deduplicated; their order is the record of what happened.

use crate::StageId;
use serde::{Deserialize, Serialize};

/// Ordered, append-only sequence of human-readable audit entries
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog(Vec<String>);

impl AuditLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Resume from entries produced before this run (e.g. an upstream system)
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self(entries.into_iter().filter(|e| !e.trim().is_empty()).collect())
    }

    /// Append an entry. Blank entries carry no narration and are dropped.
    pub fn append(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if entry.trim().is_empty() {
            return;
        }
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Whether the opening marker of `stage` has been logged
    pub fn has_marker(&self, stage: StageId) -> bool {
        let marker = format!("{} ", stage.marker());
        self.0.iter().any(|e| e.starts_with(&marker))
    }

    /// Stages whose markers appear in the log, in the order they were logged
    pub fn stage_markers(&self) -> Vec<StageId> {
        self.0
            .iter()
            .filter_map(|e| {
                StageId::ALL
                    .into_iter()
                    .find(|s| e.starts_with(&format!("{} ", s.marker())))
            })
            .collect()
    }

    pub fn into_entries(self) -> Vec<String> {
        self.0
    }
}
