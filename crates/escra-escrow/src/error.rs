//! # Escrow Error Types
//!
//! Structured error hierarchy for the escrow subsystem. Every variant
//! carries diagnostic context: the operation that failed, the state at the
//! time of failure, and actionable information for operators.
//!
//! [`ErrorKind`] collapses the hierarchy into the six-value taxonomy the
//! transport layer maps to status codes.

use thiserror::Error;

use escra_core::{CoreError, DisputeId, MilestoneId, ProjectId};
use escra_ledger::LedgerError;

/// Errors arising from escrow operations.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// Malformed input: amount mismatch, currency mismatch, ratio out of
    /// range, or a violated posting invariant.
    #[error("escrow validation failed: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: String,
    },

    /// Attempted state transition is not in the milestone/dispute
    /// transition table.
    #[error("invalid {entity} transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        /// What was being transitioned ("milestone" or "dispute").
        entity: &'static str,
        /// The current state name.
        from: String,
        /// The attempted target state name.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// No milestone with the given identifier.
    #[error("milestone {0} not found")]
    MilestoneNotFound(MilestoneId),

    /// No dispute with the given identifier.
    #[error("dispute {0} not found")]
    DisputeNotFound(DisputeId),

    /// No project with the given identifier.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    /// The caller lacks the role required for the operation.
    #[error("actor {actor} is not authorized to {operation}")]
    Unauthorized {
        /// The acting party that was rejected.
        actor: String,
        /// The operation that was attempted.
        operation: String,
    },

    /// Another business operation holds the milestone lock; the caller may
    /// retry.
    #[error("milestone {milestone} is being modified by a concurrent operation")]
    ConcurrentModification {
        /// The contended milestone.
        milestone: MilestoneId,
    },

    /// Wallet or journal failure surfaced during an escrow operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Domain-primitive failure surfaced during an escrow operation.
    #[error("escrow domain error: {0}")]
    Core(#[from] CoreError),
}

impl EscrowError {
    /// The transport-facing error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Core(_) => ErrorKind::Validation,
            Self::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            Self::MilestoneNotFound(_) | Self::DisputeNotFound(_) | Self::ProjectNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::Ledger(LedgerError::InsufficientFunds { .. }) => ErrorKind::InsufficientFunds,
            Self::Ledger(LedgerError::InvalidState { .. }) => ErrorKind::InvalidStateTransition,
            Self::Ledger(_) => ErrorKind::Validation,
        }
    }
}

/// The six-value error taxonomy consumed by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Wallet available balance too low.
    InsufficientFunds,
    /// Operation not legal for the current milestone/dispute status.
    InvalidStateTransition,
    /// Unknown milestone, dispute, project, or wallet reference.
    NotFound,
    /// Caller lacks the required role.
    Unauthorized,
    /// Lock contention on the milestone or wallet.
    ConcurrentModification,
}
