//! # Command Surface for the Custody Core
//!
//! Transport-agnostic contract between the escrow engine and whatever
//! carries requests to it: a tagged [`Command`] enum, read-model views,
//! and an error-code taxonomy with its agreed HTTP status mapping.
//!
//! A transport layer deserializes a [`Command`], hands it to a
//! [`CommandExecutor`], and serializes the [`CommandReply`] or the
//! [`ApiError`]'s body. No HTTP types appear in this crate.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod error;
pub mod view;

pub use command::{Command, CommandExecutor, CommandReply, LedgerSelector, OutcomeSpec};
pub use error::{ApiError, ErrorBody, ErrorCode, ErrorDetail};
pub use view::{
    DisputeView, LedgerEntryView, MilestoneView, ProjectView, SettlementView, WalletBalanceView,
};
