#![deny(missing_docs)]

//! # escra-ledger — Wallets and the Ledger Journal
//!
//! The two shared mutable resources of the custody core:
//!
//! - **Wallet** ([`wallet`]): per-(owner, currency) available/held balances.
//!   Live source of truth for balance reads.
//!
//! - **Journal** ([`journal`]): append-only record of balanced postings.
//!   Authoritative history from which wallet balances can be independently
//!   reconstructed and verified.
//!
//! - **Account** ([`account`]): the three account kinds a posting may touch —
//!   user wallets, per-milestone escrow-holding accounts, and the synthetic
//!   external funding source.
//!
//! - **Store** ([`store`]): the generic thread-safe repository both sit on.
//!   Components see only its surface, not the backing technology.
//!
//! Neither component knows the escrow state machine; sequencing and
//! atomicity of business operations belong to `escra-escrow`.

pub mod account;
pub mod error;
pub mod journal;
pub mod store;
pub mod wallet;

// Re-export primary types for ergonomic imports.
pub use account::Account;
pub use error::LedgerError;
pub use journal::{EntryDraft, EntryReference, LedgerEntry, LedgerJournal};
pub use store::Store;
pub use wallet::{Wallet, WalletBalance, WalletStore};
