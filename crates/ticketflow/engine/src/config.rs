//! Workflow configuration

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use ticketflow_types::{WorkflowError, WorkflowResult};

/// Tunables for a support workflow executor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Scores below this escalate; scores at or above it resolve
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u32,

    /// Lowest score the solution evaluation can draw
    #[serde(default = "default_score_floor")]
    pub score_floor: u32,

    /// Highest score the solution evaluation can draw
    #[serde(default = "default_score_ceiling")]
    pub score_ceiling: u32,

    /// Answer recorded by the WAIT stage when no interactive source is wired
    #[serde(default = "default_clarification_answer")]
    pub clarification_answer: String,

    /// Seed for reproducible scoring; entropy is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_seed: Option<u64>,
}

fn default_escalation_threshold() -> u32 {
    90
}

fn default_score_floor() -> u32 {
    90
}

fn default_score_ceiling() -> u32 {
    100
}

fn default_clarification_answer() -> String {
    "The user replied: It's about Product C.".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: default_escalation_threshold(),
            score_floor: default_score_floor(),
            score_ceiling: default_score_ceiling(),
            clarification_answer: default_clarification_answer(),
            score_seed: None,
        }
    }
}

impl WorkflowConfig {
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.escalation_threshold = threshold;
        self
    }

    pub fn with_score_range(mut self, floor: u32, ceiling: u32) -> Self {
        self.score_floor = floor;
        self.score_ceiling = ceiling;
        self
    }

    pub fn with_score_seed(mut self, seed: u64) -> Self {
        self.score_seed = Some(seed);
        self
    }

    pub fn score_range(&self) -> RangeInclusive<u32> {
        self.score_floor..=self.score_ceiling
    }

    /// Reject settings the executor cannot run with
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.score_floor > self.score_ceiling {
            return Err(WorkflowError::InvalidConfig(format!(
                "score range is empty: floor {} > ceiling {}",
                self.score_floor, self.score_ceiling
            )));
        }
        if self.clarification_answer.trim().is_empty() {
            return Err(WorkflowError::InvalidConfig(
                "clarification answer must not be blank".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.escalation_threshold, 90);
        assert_eq!(config.score_range(), 90..=100);
        assert!(config.score_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: WorkflowConfig =
            serde_json::from_str(r#"{"score_floor": 0, "score_seed": 11}"#).unwrap();
        assert_eq!(config.score_range(), 0..=100);
        assert_eq!(config.escalation_threshold, 90);
        assert_eq!(config.score_seed, Some(11));
    }

    #[test]
    fn test_empty_range_rejected() {
        let config = WorkflowConfig::default().with_score_range(95, 80);
        assert!(config.validate().is_err());
    }
}
