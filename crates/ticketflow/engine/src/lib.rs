//! Ticketflow Engine: staged execution of support tickets
//!
//! A support ticket enters as a [`SeedRecord`], is turned into a
//! [`CaseRecord`] and threaded through eleven stages:
//!
//! ```text
//! INTAKE → UNDERSTAND → PREPARE → ASK ─┬→ WAIT ─┐
//!                                      └────────┴→ RETRIEVE → DECIDE ─┬→ END (escalated)
//!                                                                     └→ UPDATE → CREATE → DO → COMPLETE
//! ```
//!
//! Stages delegate their domain work to capability providers through
//! the `ticketflow_capability::CapabilityRouter` and narrate what they
//! did into the record's audit log.
//!
//! # Example
//!
//! ```rust
//! use ticketflow_capability::FixedScore;
//! use ticketflow_engine::{Terminal, WorkflowExecutor};
//! use ticketflow_types::SeedRecord;
//!
//! let executor = WorkflowExecutor::builder()
//!     .with_score_source(FixedScore::new(95))
//!     .build()
//!     .unwrap();
//!
//! let outcome = executor.run(SeedRecord::sample()).unwrap();
//! assert_eq!(outcome.terminal, Terminal::Completed);
//! assert!(outcome.payload.final_response_to_customer.is_some());
//! ```

#![deny(unsafe_code)]

pub mod answer;
pub mod config;
pub mod executor;
pub mod graph;
pub mod stages;

pub use answer::{AnswerSource, CannedAnswer};
pub use config::WorkflowConfig;
pub use executor::{ExecutorBuilder, RunId, RunOutcome, Terminal, WorkflowExecutor};
pub use graph::{Branch, BranchFn, Route, Transition, WorkflowGraph};
pub use stages::StageRunner;

pub use ticketflow_types::{
    CaseRecord, CompletionPayload, Decision, SeedRecord, StageId, WorkflowError, WorkflowResult,
};
