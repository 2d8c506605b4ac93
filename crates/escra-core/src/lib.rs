#![deny(missing_docs)]

//! # escra-core — Foundational Types for the Escra Custody Core
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `thiserror`,
//! `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`ProjectId`] where a [`MilestoneId`]
//!    is expected.
//!
//! 2. **Money is integer, always.** [`Amount`] carries smallest currency
//!    units (cents). Floating-point values never enter monetary arithmetic;
//!    the only `f64` in the crate is the wire-side input to
//!    [`SplitRatio::from_ratio`], which is quantized to basis points before
//!    any money math happens.
//!
//! 3. **[`CoreError`] hierarchy.** Structured errors with `thiserror` — no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::CoreError;
pub use identity::{ActorId, DisputeId, MilestoneId, PostingId, ProjectId};
pub use money::{Amount, Currency, SplitRatio};
pub use temporal::Timestamp;
