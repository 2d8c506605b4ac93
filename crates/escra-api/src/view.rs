//! # Read-Model Views
//!
//! Flattened, serialization-friendly projections of the domain records.
//! Views render identifiers and accounts as their prefixed display strings
//! and amounts as integer minor units, so clients never parse domain
//! internals.

use serde::{Deserialize, Serialize};

use escra_escrow::{
    Dispute, DisputeOutcome, DisputeStatus, Milestone, MilestoneStatus, Project,
    ResolutionOutcome, Settlement,
};
use escra_ledger::{EntryReference, LedgerEntry, WalletBalance};

/// A project, rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectView {
    /// Prefixed project identifier.
    pub id: String,
    /// The paying client.
    pub client: String,
    /// The assigned consultant.
    pub consultant: String,
    /// Administrators, sorted.
    pub admins: Vec<String>,
    /// Creation time, canonical UTC.
    pub created_at: String,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            client: project.client.to_string(),
            consultant: project.consultant.to_string(),
            admins: project.admins.iter().map(ToString::to_string).collect(),
            created_at: project.created_at.to_canonical_string(),
        }
    }
}

/// A milestone with its custody progress, rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneView {
    /// Prefixed milestone identifier.
    pub id: String,
    /// Prefixed owning-project identifier.
    pub project: String,
    /// Human-readable title.
    pub title: String,
    /// The payment amount, in minor units.
    pub amount_units: i64,
    /// The settlement currency code.
    pub currency: String,
    /// Current custody status.
    pub status: MilestoneStatus,
    /// Custody progress, 0–100.
    pub progress_percent: u8,
    /// Agreed completion date, canonical UTC, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// How a dispute over this milestone was settled, if resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionOutcome>,
    /// Creation time, canonical UTC.
    pub created_at: String,
    /// Last update time, canonical UTC.
    pub updated_at: String,
}

impl MilestoneView {
    /// Project a milestone together with its progress percentage.
    pub fn from_parts(milestone: &Milestone, progress_percent: u8) -> Self {
        Self {
            id: milestone.id.to_string(),
            project: milestone.project.to_string(),
            title: milestone.title.clone(),
            amount_units: milestone.amount.minor_units(),
            currency: milestone.currency.to_string(),
            status: milestone.status,
            progress_percent,
            due_date: milestone.due_date.as_ref().map(|d| d.to_canonical_string()),
            resolution: milestone.resolution,
            created_at: milestone.created_at.to_canonical_string(),
            updated_at: milestone.updated_at.to_canonical_string(),
        }
    }
}

/// A dispute, rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeView {
    /// Prefixed dispute identifier.
    pub id: String,
    /// Prefixed owning-project identifier.
    pub project: String,
    /// Prefixed disputed-milestone identifier.
    pub milestone: String,
    /// Who opened the dispute.
    pub opened_by: String,
    /// The opener's stated reason.
    pub reason: String,
    /// Current status.
    pub status: DisputeStatus,
    /// The settlement decision, present once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DisputeOutcome>,
    /// The adjudicator's notes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the dispute was opened, canonical UTC.
    pub opened_at: String,
    /// When the dispute was resolved, canonical UTC, if it has been.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl From<&Dispute> for DisputeView {
    fn from(dispute: &Dispute) -> Self {
        Self {
            id: dispute.id.to_string(),
            project: dispute.project.to_string(),
            milestone: dispute.milestone.to_string(),
            opened_by: dispute.opened_by.to_string(),
            reason: dispute.reason.clone(),
            status: dispute.status,
            outcome: dispute.outcome,
            notes: dispute.notes.clone(),
            opened_at: dispute.opened_at.to_canonical_string(),
            resolved_at: dispute
                .resolved_at
                .as_ref()
                .map(|t| t.to_canonical_string()),
        }
    }
}

/// A dispute settlement, rendered for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementView {
    /// The portion returned to the client, in minor units.
    pub client_part_units: i64,
    /// The portion paid to the consultant, in minor units.
    pub freelancer_part_units: i64,
}

impl From<Settlement> for SettlementView {
    fn from(settlement: Settlement) -> Self {
        Self {
            client_part_units: settlement.client_part.minor_units(),
            freelancer_part_units: settlement.freelancer_part.minor_units(),
        }
    }
}

/// Wallet balances for one (owner, currency) pair, rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalanceView {
    /// The wallet owner.
    pub owner: String,
    /// The wallet currency code.
    pub currency: String,
    /// Funds spendable on new commitments, in minor units.
    pub available_units: i64,
    /// Funds earmarked and unavailable, in minor units.
    pub held_units: i64,
}

impl WalletBalanceView {
    /// Project a balance for one (owner, currency) pair.
    pub fn from_parts(owner: &str, currency: &str, balance: WalletBalance) -> Self {
        Self {
            owner: owner.to_string(),
            currency: currency.to_string(),
            available_units: balance.available.minor_units(),
            held_units: balance.held.minor_units(),
        }
    }
}

/// One journal posting, rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryView {
    /// Prefixed posting identifier.
    pub id: String,
    /// Prefixed project identifier, absent for external deposits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Prefixed milestone identifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    /// The account value moved out of.
    pub debit: String,
    /// The account value moved into.
    pub credit: String,
    /// The amount moved, in minor units.
    pub amount_units: i64,
    /// The settlement currency code.
    pub currency: String,
    /// When the posting was appended, canonical UTC.
    pub timestamp: String,
    /// Prefixed dispute identifier for settlement postings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<&LedgerEntry> for LedgerEntryView {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            project: entry.project.map(|p| p.to_string()),
            milestone: entry.milestone.map(|m| m.to_string()),
            debit: entry.debit.to_string(),
            credit: entry.credit.to_string(),
            amount_units: entry.amount.minor_units(),
            currency: entry.currency.to_string(),
            timestamp: entry.timestamp.to_canonical_string(),
            reference: entry.reference.as_ref().map(|r| match r {
                EntryReference::Dispute { dispute } => dispute.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escra_core::{ActorId, Amount, Currency, ProjectId};

    #[test]
    fn milestone_view_flattens_domain_types() {
        let milestone = Milestone::new(
            ProjectId::new(),
            "Design phase",
            Amount::from_minor_units(50_000).unwrap(),
            Currency::new("USD").unwrap(),
            None,
        )
        .unwrap();
        let view = MilestoneView::from_parts(&milestone, 0);

        assert!(view.id.starts_with("milestone:"));
        assert!(view.project.starts_with("project:"));
        assert_eq!(view.amount_units, 50_000);
        assert_eq!(view.currency, "USD");
        assert_eq!(view.status, MilestoneStatus::Pending);

        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"PENDING\""));
        // Absent options are omitted entirely.
        assert!(!json.contains("due_date"));
        assert!(!json.contains("resolution"));
    }

    #[test]
    fn project_view_renders_participants() {
        let project = Project::new(
            ActorId::new("client-c1").unwrap(),
            ActorId::new("consultant-f1").unwrap(),
            [ActorId::new("admin-a1").unwrap()],
        );
        let view = ProjectView::from(&project);
        assert_eq!(view.client, "client-c1");
        assert_eq!(view.admins, vec!["admin-a1".to_string()]);
    }

    #[test]
    fn dispute_view_roundtrips() {
        let dispute = Dispute::open(
            ProjectId::new(),
            escra_core::MilestoneId::new(),
            ActorId::new("client-c1").unwrap(),
            "work not delivered",
        );
        let view = DisputeView::from(&dispute);
        let json = serde_json::to_string(&view).unwrap();
        let back: DisputeView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
        assert_eq!(back.status, DisputeStatus::Open);
        assert!(back.resolved_at.is_none());
    }
}
