//! Ticketflow Domain Types
//!
//! A support ticket is worked by a **staged workflow**: a fixed graph of
//! named stages that each receive the case record, ask capability
//! providers for domain work, write the fields they own and append to
//! the audit trail.
//!
//! # Key Concepts
//!
//! - **CaseRecord**: The single state object threaded through a run.
//!   Identity fields come from the seed, derived fields are written by
//!   the stage that produces them.
//! - **AuditLog**: Ordered, append-only narration of what happened.
//! - **StageId**: The eleven named stages of the support workflow.
//! - **ProviderId / Operation**: The capability contract. Stages ask for
//!   an operation on a provider and receive a [`CapabilityOutput`].
//! - **CompletionPayload**: What the caller gets back at a terminal state.
//!
//! # Design Principles
//!
//! 1. Providers read, stages write. Nothing but a stage mutates a record.
//! 2. Fields are set, never removed. The audit log only grows.
//! 3. Missing identity data is rejected at intake, never papered over.

#![deny(unsafe_code)]

mod audit;
mod capability;
mod errors;
mod payload;
mod record;
mod stage;

pub use audit::*;
pub use capability::*;
pub use errors::*;
pub use payload::*;
pub use record::*;
pub use stage::*;
