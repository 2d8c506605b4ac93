//! # Escrow Engine
//!
//! Fund custody for the consulting marketplace: milestone escrow,
//! release/refund payouts, and dispute settlement, all driven through one
//! controller and journaled by `escra-ledger`.
//!
//! ## Architecture
//!
//! - [`controller`] — [`EscrowController`], the single entry point that
//!   sequences every custody operation across the stores.
//! - [`milestone`] — milestone records and the custody state machine.
//! - [`project`] — projects, participant roles, and release authority.
//! - [`dispute`] — dispute records, statuses, and outcomes.
//! - [`resolver`] — pure settlement arithmetic for dispute outcomes.
//! - [`error`] — the escrow error hierarchy and its transport taxonomy.
//!
//! ## Custody Invariants
//!
//! Value is conserved: every movement is a balanced journal posting, funds
//! only enter through external deposits, and a dispute split always sums
//! to the exact disputed amount. Milestone and dispute statuses only move
//! along the closed transition table.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod dispute;
pub mod error;
pub mod milestone;
pub mod project;
pub mod resolver;

pub use controller::{EscrowController, JournalAudit};
pub use dispute::{Dispute, DisputeOutcome, DisputeStatus, ResolutionOutcome};
pub use error::{ErrorKind, EscrowError};
pub use milestone::{
    Milestone, MilestoneProgress, MilestoneStatus, MilestoneTracker, transition_table,
};
pub use project::{Project, ProjectRegistry, ReleaseAuthority};
pub use resolver::{settlement, Settlement};
