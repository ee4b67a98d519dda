//! Stage identifiers for the support workflow

use serde::{Deserialize, Serialize};

/// One of the eleven named stages of the support workflow.
///
/// Variants are declared in pipeline order, so `Ord` follows the
/// ordinal numbering used in audit markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageId {
    Intake,
    Understand,
    Prepare,
    Ask,
    Wait,
    Retrieve,
    Decide,
    Update,
    Create,
    Do,
    Complete,
}

impl StageId {
    /// All stages in pipeline order
    pub const ALL: [StageId; 11] = [
        StageId::Intake,
        StageId::Understand,
        StageId::Prepare,
        StageId::Ask,
        StageId::Wait,
        StageId::Retrieve,
        StageId::Decide,
        StageId::Update,
        StageId::Create,
        StageId::Do,
        StageId::Complete,
    ];

    /// 1-based position in the pipeline
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    /// Upper-case stage name as it appears in audit entries
    pub fn name(self) -> &'static str {
        match self {
            StageId::Intake => "INTAKE",
            StageId::Understand => "UNDERSTAND",
            StageId::Prepare => "PREPARE",
            StageId::Ask => "ASK",
            StageId::Wait => "WAIT",
            StageId::Retrieve => "RETRIEVE",
            StageId::Decide => "DECIDE",
            StageId::Update => "UPDATE",
            StageId::Create => "CREATE",
            StageId::Do => "DO",
            StageId::Complete => "COMPLETE",
        }
    }

    /// The prefix every stage's opening audit entry starts with,
    /// e.g. `Stage 8: UPDATE`
    pub fn marker(self) -> String {
        format!("Stage {}: {}", self.ordinal(), self.name())
    }

    /// Parse an upper- or lower-case stage name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
