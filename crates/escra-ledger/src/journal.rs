//! # Ledger Journal
//!
//! Append-only record of balanced double-entry postings. Each posting moves
//! value from exactly one debit account to exactly one credit account of
//! equal amount in the same currency; postings are immutable once appended.
//!
//! The journal is the authoritative history. Wallet balances are the live
//! view; replaying the journal from empty state must reproduce them, and
//! [`LedgerJournal::reconstruct_wallet_units`] exists so callers can verify
//! that — it cross-checks the wallet store, never substitutes for it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use escra_core::{
    ActorId, Amount, Currency, DisputeId, MilestoneId, PostingId, ProjectId, Timestamp,
};

use crate::account::Account;
use crate::error::LedgerError;

// ── Entries ────────────────────────────────────────────────────────────

/// A business context a posting can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryReference {
    /// The posting settles a dispute.
    Dispute {
        /// The dispute being settled.
        dispute: DisputeId,
    },
}

/// One immutable ledger posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique posting identifier, assigned at append time.
    pub id: PostingId,
    /// The project this posting belongs to. External deposits into a
    /// wallet carry no project.
    pub project: Option<ProjectId>,
    /// The milestone this posting belongs to, if any.
    pub milestone: Option<MilestoneId>,
    /// The account value moves out of.
    pub debit: Account,
    /// The account value moves into.
    pub credit: Account,
    /// The amount moved (equal on both sides by construction).
    pub amount: Amount,
    /// The settlement currency.
    pub currency: Currency,
    /// When the posting was appended (UTC), assigned at append time.
    pub timestamp: Timestamp,
    /// Optional business context (e.g., the dispute a settlement belongs to).
    pub reference: Option<EntryReference>,
}

/// A posting before the journal assigns its identity and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// The project this posting belongs to, if any.
    pub project: Option<ProjectId>,
    /// The milestone this posting belongs to, if any.
    pub milestone: Option<MilestoneId>,
    /// The account value moves out of.
    pub debit: Account,
    /// The account value moves into.
    pub credit: Account,
    /// The amount to move.
    pub amount: Amount,
    /// The settlement currency.
    pub currency: Currency,
    /// Optional business context.
    pub reference: Option<EntryReference>,
}

impl EntryDraft {
    /// Validate the draft against the posting invariants: distinct debit
    /// and credit accounts, strictly positive amount.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] describing the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.debit == self.credit {
            return Err(LedgerError::Validation {
                reason: format!(
                    "debit and credit accounts are identical: {}",
                    self.debit
                ),
            });
        }
        if !self.amount.is_positive() {
            return Err(LedgerError::Validation {
                reason: format!("posting amount must be positive, got {}", self.amount),
            });
        }
        Ok(())
    }
}

// ── Journal ────────────────────────────────────────────────────────────

/// Append-only journal of postings, in insertion order.
///
/// Cloneable handle over shared state, like every store in the workspace.
/// Entries are never updated or removed.
#[derive(Debug, Clone, Default)]
pub struct LedgerJournal {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl LedgerJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Validate and append a posting, assigning its id and timestamp.
    /// Returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] if the draft violates the
    /// posting invariants.
    pub fn append(&self, draft: EntryDraft) -> Result<LedgerEntry, LedgerError> {
        draft.validate()?;
        let entry = LedgerEntry {
            id: PostingId::new(),
            project: draft.project,
            milestone: draft.milestone,
            debit: draft.debit,
            credit: draft.credit,
            amount: draft.amount,
            currency: draft.currency,
            timestamp: Timestamp::now(),
            reference: draft.reference,
        };
        self.entries.write().push(entry.clone());
        Ok(entry)
    }

    /// Postings for a project, in append order.
    ///
    /// Returns an owned snapshot iterator: finite, restartable by calling
    /// again, and independent of subsequent appends.
    pub fn postings_for_project(
        &self,
        project: &ProjectId,
    ) -> impl Iterator<Item = LedgerEntry> {
        let project = *project;
        self.entries
            .read()
            .iter()
            .filter(|e| e.project == Some(project))
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Postings for a milestone, in append order.
    pub fn postings_for_milestone(
        &self,
        milestone: &MilestoneId,
    ) -> impl Iterator<Item = LedgerEntry> {
        let milestone = *milestone;
        self.entries
            .read()
            .iter()
            .filter(|e| e.milestone == Some(milestone))
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// A snapshot of every posting, in append order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().clone()
    }

    /// Replay the journal from empty state and net an owner's wallet in one
    /// currency: credits into the wallet add, debits out subtract.
    ///
    /// The result equals the wallet's `available + held` total when the
    /// wallet store and journal are consistent. Holds move value between the
    /// two balances of one wallet and therefore do not appear in the journal.
    pub fn reconstruct_wallet_units(
        &self,
        owner: &ActorId,
        currency: &Currency,
    ) -> i64 {
        let account = Account::wallet(owner.clone());
        self.net_units(&account, currency)
    }

    /// Replay the journal and net the escrow-holding account for one
    /// (project, milestone) pair.
    pub fn reconstruct_escrow_units(
        &self,
        project: &ProjectId,
        milestone: &MilestoneId,
        currency: &Currency,
    ) -> i64 {
        let account = Account::escrow_holding(*project, *milestone);
        self.net_units(&account, currency)
    }

    fn net_units(&self, account: &Account, currency: &Currency) -> i64 {
        self.entries
            .read()
            .iter()
            .filter(|e| &e.currency == currency)
            .map(|e| {
                let units = e.amount.minor_units();
                if &e.credit == account {
                    units
                } else if &e.debit == account {
                    -units
                } else {
                    0
                }
            })
            .sum()
    }

    /// Number of postings appended so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the journal has no postings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
