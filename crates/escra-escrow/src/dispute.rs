//! # Dispute Records
//!
//! A dispute is a formal disagreement over a funded milestone's outcome,
//! resolved exactly once by an authorized adjudicator into release, refund,
//! or a ratio split. Opening a dispute moves no funds; settlement postings
//! are produced by the controller when the dispute is resolved.

use serde::{Deserialize, Serialize};

use escra_core::{ActorId, DisputeId, MilestoneId, ProjectId, SplitRatio, Timestamp};

// ── Status & Outcome ───────────────────────────────────────────────────

/// The lifecycle status of a dispute. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    /// Awaiting adjudication; at most one open dispute exists per milestone.
    Open,
    /// Settled by an adjudicator. Terminal state.
    Resolved,
}

impl DisputeStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a dispute is settled. The split ratio only exists for `Split`, so an
/// out-of-place ratio is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisputeOutcome {
    /// The full amount returns to the client.
    Refund,
    /// The full amount pays out to the consultant.
    Release,
    /// The amount splits between the parties by the client's share ratio.
    Split {
        /// The client's share of the milestone amount.
        ratio: SplitRatio,
    },
}

impl DisputeOutcome {
    /// The canonical string name of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Release => "release",
            Self::Split { .. } => "split",
        }
    }
}

impl std::fmt::Display for DisputeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The settlement annotation recorded on a resolved milestone, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Settled as a full refund to the client.
    Refund,
    /// Settled as a full release to the consultant.
    Release,
    /// Settled as a ratio split between the parties.
    Split,
}

impl From<DisputeOutcome> for ResolutionOutcome {
    fn from(outcome: DisputeOutcome) -> Self {
        match outcome {
            DisputeOutcome::Refund => Self::Refund,
            DisputeOutcome::Release => Self::Release,
            DisputeOutcome::Split { .. } => Self::Split,
        }
    }
}

// ── Dispute ────────────────────────────────────────────────────────────

/// A dispute over a funded milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Unique dispute identifier.
    pub id: DisputeId,
    /// The owning project.
    pub project: ProjectId,
    /// The disputed milestone.
    pub milestone: MilestoneId,
    /// Who opened the dispute.
    pub opened_by: ActorId,
    /// The opener's stated reason.
    pub reason: String,
    /// Current status.
    pub status: DisputeStatus,
    /// The settlement decision, present once resolved.
    pub outcome: Option<DisputeOutcome>,
    /// The adjudicator's notes, recorded at resolution.
    pub notes: Option<String>,
    /// When the dispute was opened (UTC).
    pub opened_at: Timestamp,
    /// When the dispute was resolved (UTC), if it has been.
    pub resolved_at: Option<Timestamp>,
}

impl Dispute {
    /// Open a new dispute. This is the only constructor: a dispute always
    /// starts in [`Open`](DisputeStatus::Open) with no outcome.
    pub fn open(
        project: ProjectId,
        milestone: MilestoneId,
        opened_by: ActorId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: DisputeId::new(),
            project,
            milestone,
            opened_by,
            reason: reason.into(),
            status: DisputeStatus::Open,
            outcome: None,
            notes: None,
            opened_at: Timestamp::now(),
            resolved_at: None,
        }
    }

    /// Whether the dispute is still awaiting adjudication.
    pub fn is_open(&self) -> bool {
        self.status == DisputeStatus::Open
    }
}
