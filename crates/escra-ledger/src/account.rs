//! # Ledger Accounts
//!
//! The three kinds of account a posting may debit or credit. Value only
//! ever moves between these; a posting's currency selects the concrete
//! wallet for [`Account::Wallet`] references.

use serde::{Deserialize, Serialize};

use escra_core::{ActorId, MilestoneId, ProjectId};

/// One side of a ledger posting.
///
/// Derives `Ord` so that operations touching several accounts can acquire
/// resources in a fixed global order, which is the deadlock-avoidance rule
/// the custody core follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Account {
    /// The synthetic external funding source. Credits from here are the
    /// only way value enters the system (initial client deposits).
    External,
    /// A user wallet, owned by a client or consultant. The posting's
    /// currency identifies the concrete (owner, currency) wallet.
    Wallet {
        /// The wallet owner.
        owner: ActorId,
    },
    /// The synthetic custody account for one (project, milestone) pair.
    /// Funds here are neither the client's nor the consultant's.
    EscrowHolding {
        /// The owning project.
        project: ProjectId,
        /// The milestone the funds are held against.
        milestone: MilestoneId,
    },
}

impl Account {
    /// Construct a wallet account reference.
    pub fn wallet(owner: ActorId) -> Self {
        Self::Wallet { owner }
    }

    /// Construct an escrow-holding account reference.
    pub fn escrow_holding(project: ProjectId, milestone: MilestoneId) -> Self {
        Self::EscrowHolding { project, milestone }
    }

    /// Whether this is the external funding source.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }

    /// The wallet owner, if this is a wallet account.
    pub fn wallet_owner(&self) -> Option<&ActorId> {
        match self {
            Self::Wallet { owner } => Some(owner),
            _ => None,
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Wallet { owner } => write!(f, "wallet:{owner}"),
            Self::EscrowHolding { project, milestone } => {
                write!(f, "escrow:{}:{}", project.as_uuid(), milestone.as_uuid())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    #[test]
    fn display_forms() {
        assert_eq!(format!("{}", Account::External), "external");
        assert_eq!(
            format!("{}", Account::wallet(owner("client-c1"))),
            "wallet:client-c1"
        );
        let escrow = Account::escrow_holding(ProjectId::new(), MilestoneId::new());
        assert!(format!("{escrow}").starts_with("escrow:"));
    }

    #[test]
    fn wallet_owner_accessor() {
        let account = Account::wallet(owner("c1"));
        assert_eq!(account.wallet_owner(), Some(&owner("c1")));
        assert_eq!(Account::External.wallet_owner(), None);
    }

    #[test]
    fn external_sorts_first() {
        // Fixed global acquisition order relies on a total order over
        // account kinds; External precedes wallets and escrow accounts.
        let mut accounts = vec![
            Account::escrow_holding(ProjectId::new(), MilestoneId::new()),
            Account::wallet(owner("z")),
            Account::External,
        ];
        accounts.sort();
        assert_eq!(accounts[0], Account::External);
        assert!(matches!(accounts[1], Account::Wallet { .. }));
    }

    #[test]
    fn serde_tagged_roundtrip() {
        let escrow = Account::escrow_holding(ProjectId::new(), MilestoneId::new());
        let json = serde_json::to_string(&escrow).unwrap();
        assert!(json.contains("\"kind\":\"escrow_holding\""));
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, escrow);
    }
}
