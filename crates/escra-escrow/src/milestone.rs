//! # Milestone Tracking
//!
//! Milestone records and the custody state machine:
//! `Pending → Funded → {Released, Refunded, Disputed}`; `Disputed → Resolved`.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! [`MilestoneStatus`] is a validated enum (runtime-checked) rather than a
//! typestate. Milestones are stored, serialized, and transmitted where the
//! state is not known at compile time, and [`MilestoneTracker::set_status`]
//! is the single point of truth for legal transitions — every caller,
//! including the escrow controller, goes through the same transition table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use escra_core::{Amount, Currency, MilestoneId, ProjectId, Timestamp};
use escra_ledger::Store;

use crate::dispute::ResolutionOutcome;
use crate::error::EscrowError;

// ── Status ─────────────────────────────────────────────────────────────

/// The custody state of a milestone.
///
/// ## Transition Graph
///
/// ```text
/// Pending ──fund()──▶ Funded ──release()──▶ Released
///                        │
///                        ├──refund()──▶ Refunded
///                        │
///                        └──open_dispute()──▶ Disputed ──resolve()──▶ Resolved
/// ```
///
/// `Released`, `Refunded`, and `Resolved` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    /// Created, awaiting funding.
    Pending,
    /// Client funds are in the escrow-holding account.
    Funded,
    /// Funds paid out to the consultant. Terminal state.
    Released,
    /// Funds returned to the client. Terminal state.
    Refunded,
    /// A dispute is open over the funded amount.
    Disputed,
    /// Dispute settled by an adjudicator. Terminal state.
    Resolved,
}

impl MilestoneStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Funded => "FUNDED",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
            Self::Disputed => "DISPUTED",
            Self::Resolved => "RESOLVED",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded | Self::Resolved)
    }

    /// Valid target statuses from this status — the transition table.
    pub fn valid_transitions(&self) -> &'static [MilestoneStatus] {
        match self {
            Self::Pending => &[Self::Funded],
            Self::Funded => &[Self::Released, Self::Refunded, Self::Disputed],
            Self::Disputed => &[Self::Resolved],
            Self::Released | Self::Refunded | Self::Resolved => &[],
        }
    }

    /// Whether `next` is a legal transition from this status.
    pub fn can_transition_to(&self, next: MilestoneStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Milestone ──────────────────────────────────────────────────────────

/// A unit of project work with an associated payment amount and custody
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique milestone identifier.
    pub id: MilestoneId,
    /// The owning project.
    pub project: ProjectId,
    /// Human-readable title.
    pub title: String,
    /// The payment amount held against this milestone.
    pub amount: Amount,
    /// The settlement currency.
    pub currency: Currency,
    /// Current custody status.
    pub status: MilestoneStatus,
    /// Agreed completion date, if any.
    pub due_date: Option<Timestamp>,
    /// How a dispute over this milestone was settled. Present only when
    /// status is [`Resolved`](MilestoneStatus::Resolved); display-only.
    pub resolution: Option<ResolutionOutcome>,
    /// When the milestone was created (UTC).
    pub created_at: Timestamp,
    /// When the milestone was last updated (UTC).
    pub updated_at: Timestamp,
}

impl Milestone {
    /// Create a milestone in [`Pending`](MilestoneStatus::Pending) status.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Validation`] if the amount is not strictly
    /// positive.
    pub fn new(
        project: ProjectId,
        title: impl Into<String>,
        amount: Amount,
        currency: Currency,
        due_date: Option<Timestamp>,
    ) -> Result<Self, EscrowError> {
        if !amount.is_positive() {
            return Err(EscrowError::Validation {
                reason: format!("milestone amount must be positive, got {amount}"),
            });
        }
        let now = Timestamp::now();
        Ok(Self {
            id: MilestoneId::new(),
            project,
            title: title.into(),
            amount,
            currency,
            status: MilestoneStatus::Pending,
            due_date,
            resolution: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Custody progress for display: the status plus a completion percentage.
///
/// The marketplace front end renders this as a milestone progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    /// Current custody status.
    pub status: MilestoneStatus,
    /// Custody progress, 0–100.
    pub percent: u8,
}

// ── Tracker ────────────────────────────────────────────────────────────

/// Store of milestone records and the single enforcement point for the
/// status transition table.
///
/// The escrow controller consults this tracker before any wallet or ledger
/// mutation; no other component changes a milestone's status.
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    milestones: Store<MilestoneId, Milestone>,
}

impl MilestoneTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            milestones: Store::new(),
        }
    }

    /// Register a milestone.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Validation`] if a milestone with the same id
    /// already exists.
    pub fn insert(&self, milestone: Milestone) -> Result<(), EscrowError> {
        if self.milestones.contains(&milestone.id) {
            return Err(EscrowError::Validation {
                reason: format!("milestone {} already exists", milestone.id),
            });
        }
        self.milestones.insert(milestone.id, milestone);
        Ok(())
    }

    /// Retrieve a milestone by id.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::MilestoneNotFound`] for unknown ids.
    pub fn get(&self, id: &MilestoneId) -> Result<Milestone, EscrowError> {
        self.milestones
            .get(id)
            .ok_or(EscrowError::MilestoneNotFound(*id))
    }

    /// Transition a milestone to `next`, enforcing the transition table.
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InvalidStateTransition`] for any edge not in
    /// the table, [`EscrowError::MilestoneNotFound`] for unknown ids.
    pub fn set_status(
        &self,
        id: &MilestoneId,
        next: MilestoneStatus,
    ) -> Result<Milestone, EscrowError> {
        self.transition(id, next, None)
    }

    /// Transition a disputed milestone to `Resolved`, recording the
    /// settlement outcome annotation.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`set_status`](Self::set_status).
    pub fn set_resolved(
        &self,
        id: &MilestoneId,
        outcome: ResolutionOutcome,
    ) -> Result<Milestone, EscrowError> {
        self.transition(id, MilestoneStatus::Resolved, Some(outcome))
    }

    /// Custody progress for a milestone.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::MilestoneNotFound`] for unknown ids.
    pub fn progress(&self, id: &MilestoneId) -> Result<MilestoneProgress, EscrowError> {
        let milestone = self.get(id)?;
        let percent = match milestone.status {
            MilestoneStatus::Pending => 0,
            MilestoneStatus::Funded => 50,
            MilestoneStatus::Disputed => 75,
            MilestoneStatus::Released
            | MilestoneStatus::Refunded
            | MilestoneStatus::Resolved => 100,
        };
        Ok(MilestoneProgress {
            status: milestone.status,
            percent,
        })
    }

    /// All milestones for a project.
    pub fn for_project(&self, project: &ProjectId) -> Vec<Milestone> {
        let mut milestones: Vec<Milestone> = self
            .milestones
            .list()
            .into_iter()
            .filter(|m| &m.project == project)
            .collect();
        milestones.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        milestones
    }

    fn transition(
        &self,
        id: &MilestoneId,
        next: MilestoneStatus,
        resolution: Option<ResolutionOutcome>,
    ) -> Result<Milestone, EscrowError> {
        self.milestones
            .try_update(id, |milestone| {
                if !milestone.status.can_transition_to(next) {
                    return Err(EscrowError::InvalidStateTransition {
                        entity: "milestone",
                        from: milestone.status.as_str().to_string(),
                        to: next.as_str().to_string(),
                        reason: if milestone.status.is_terminal() {
                            "milestone is in a terminal status".to_string()
                        } else {
                            format!("transition not in the table for {}", milestone.status)
                        },
                    });
                }
                milestone.status = next;
                if resolution.is_some() {
                    milestone.resolution = resolution;
                }
                milestone.updated_at = Timestamp::now();
                Ok(milestone.clone())
            })
            .ok_or(EscrowError::MilestoneNotFound(*id))?
    }
}

/// The full transition table as (from, to) pairs, for exhaustive testing
/// and documentation generation.
pub fn transition_table() -> HashMap<MilestoneStatus, &'static [MilestoneStatus]> {
    use MilestoneStatus::*;
    [Pending, Funded, Released, Refunded, Disputed, Resolved]
        .into_iter()
        .map(|s| (s, s.valid_transitions()))
        .collect()
}
