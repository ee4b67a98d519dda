//! Capability providers for Ticketflow
//!
//! Stages reach external systems only through the [`CapabilityRouter`].
//! Each provider owns a fixed set of [`Operation`]s and answers them as a
//! pure function of a read-only case record.
//!
//! # Providers
//!
//! - [`CommonProvider`]: general-purpose operations (parsing, field
//!   normalization, flag calculation, scoring, response templating)
//! - [`AtlasProvider`]: domain operations (entity extraction, CRM
//!   enrichment, knowledge base, ticketing and notification calls)
//! - [`ScriptedProvider`]: deterministic test double with canned outputs
//!   and a call journal
//!
//! # Example
//!
//! ```rust
//! use ticketflow_capability::{CapabilityRouter, FixedScore};
//! use ticketflow_types::*;
//!
//! let router = CapabilityRouter::standard(FixedScore::new(95), 90..=100);
//! let record = CaseRecord::from_seed(SeedRecord::sample()).unwrap();
//!
//! let out = router
//!     .dispatch(ProviderId::Atlas, Operation::ExtractEntities, &record)
//!     .unwrap();
//! assert_eq!(out.into_string_mapping(Operation::ExtractEntities).unwrap()["product"], "B");
//!
//! // COMMON does not own entity extraction
//! assert!(router
//!     .dispatch(ProviderId::Common, Operation::ExtractEntities, &record)
//!     .is_err());
//! ```

#![deny(unsafe_code)]

pub mod atlas;
pub mod common;
pub mod provider;
pub mod router;
pub mod scoring;
pub mod scripted;

pub use atlas::AtlasProvider;
pub use common::CommonProvider;
pub use provider::CapabilityProvider;
pub use router::CapabilityRouter;
pub use scoring::{EntropyScore, FixedScore, ScoreSource, SeededScore};
pub use scripted::ScriptedProvider;

pub use ticketflow_types::{CapabilityOutput, Operation, ProviderId};
