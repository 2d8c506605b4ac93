//! # Escrow Controller
//!
//! The single entry point for every fund-custody operation. The controller
//! owns the wallet store, the ledger journal, the milestone tracker, the
//! project registry, and the dispute store, and sequences each business
//! operation across them.
//!
//! ## Operation Ordering
//!
//! Every mutating operation follows the same recipe under a per-milestone
//! lock: resolve and authorize, validate the state transition and the
//! ledger draft, then commit. All fallible checks run before the first
//! side effect, so a rejected operation leaves no partial state behind.
//!
//! ## Locking
//!
//! One mutex per milestone, acquired with `try_lock`. A contended lock
//! fails fast with [`EscrowError::ConcurrentModification`] instead of
//! queueing; callers retry. Store-level write locks are only taken while
//! the milestone lock is held, never the other way around.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use escra_core::{ActorId, Amount, Currency, DisputeId, MilestoneId, ProjectId, Timestamp};
use escra_ledger::{
    Account, EntryDraft, EntryReference, LedgerEntry, LedgerJournal, Store, WalletBalance,
    WalletStore,
};

use crate::dispute::{Dispute, DisputeOutcome, DisputeStatus};
use crate::error::EscrowError;
use crate::milestone::{Milestone, MilestoneProgress, MilestoneStatus, MilestoneTracker};
use crate::project::{Project, ProjectRegistry, ReleaseAuthority};
use crate::resolver::{self, Settlement};

/// A wallet audit comparing live balances against a journal replay.
///
/// Holds move value between the two balances of one wallet and never
/// appear in the journal, so the comparison is against the wallet's
/// `available + held` total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalAudit {
    /// The wallet store's `available + held` total, in minor units.
    pub wallet_units: i64,
    /// The journal's netted total for the same wallet, in minor units.
    pub journal_units: i64,
}

impl JournalAudit {
    /// Whether the wallet store and the journal agree.
    pub fn is_consistent(&self) -> bool {
        self.wallet_units == self.journal_units
    }
}

/// Orchestrates fund custody: funding, release, refund, and dispute
/// settlement, with every value movement journaled.
///
/// Cloneable handle over shared state.
#[derive(Debug, Clone, Default)]
pub struct EscrowController {
    projects: ProjectRegistry,
    milestones: MilestoneTracker,
    wallets: WalletStore,
    journal: LedgerJournal,
    disputes: Store<DisputeId, Dispute>,
    dispute_index: Store<MilestoneId, DisputeId>,
    locks: Arc<Mutex<HashMap<MilestoneId, Arc<Mutex<()>>>>>,
}

impl EscrowController {
    /// Create a controller with empty stores and an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Setup ──────────────────────────────────────────────────────────

    /// Register a project.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Validation`] if client and consultant are
    /// the same actor.
    pub fn register_project(
        &self,
        client: ActorId,
        consultant: ActorId,
        admins: impl IntoIterator<Item = ActorId>,
    ) -> Result<Project, EscrowError> {
        if client == consultant {
            return Err(EscrowError::Validation {
                reason: format!("client and consultant must differ, both are {client}"),
            });
        }
        let project = Project::new(client, consultant, admins);
        self.projects.insert(project.clone())?;
        info!(
            project = %project.id,
            client = %project.client,
            consultant = %project.consultant,
            "project registered"
        );
        Ok(project)
    }

    /// Create a milestone in `PENDING` status under an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::ProjectNotFound`] for unknown projects,
    /// [`EscrowError::Validation`] for a non-positive amount.
    pub fn create_milestone(
        &self,
        project: &ProjectId,
        title: impl Into<String>,
        amount: Amount,
        currency: Currency,
        due_date: Option<Timestamp>,
    ) -> Result<Milestone, EscrowError> {
        self.projects.get(project)?;
        let milestone = Milestone::new(*project, title, amount, currency, due_date)?;
        self.milestones.insert(milestone.clone())?;
        info!(
            milestone = %milestone.id,
            project = %project,
            amount = milestone.amount.minor_units(),
            currency = %milestone.currency,
            "milestone created"
        );
        Ok(milestone)
    }

    /// Credit external value into a wallet, journaled as a posting from
    /// the external world. This is the only way value enters the system.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Validation`] for a non-positive amount.
    pub fn deposit(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, EscrowError> {
        let draft = EntryDraft {
            project: None,
            milestone: None,
            debit: Account::External,
            credit: Account::wallet(owner.clone()),
            amount,
            currency: currency.clone(),
            reference: None,
        };
        draft.validate()?;
        let balance = self.wallets.credit(owner, currency, amount)?;
        self.journal.append(draft)?;
        info!(
            %owner,
            %currency,
            amount = amount.minor_units(),
            "external deposit credited"
        );
        Ok(balance)
    }

    // ── Custody operations ─────────────────────────────────────────────

    /// Fund a milestone: debit the client's available balance by the
    /// milestone amount into the escrow-holding account, and move the
    /// milestone to `FUNDED`. Only the project's client may fund.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] if the actor is not the client,
    /// [`EscrowError::Validation`] if `amount` or `currency` does not match
    /// the milestone record, insufficient funds via [`EscrowError::Ledger`],
    /// [`EscrowError::InvalidStateTransition`] unless the milestone is
    /// `PENDING`.
    pub fn fund(
        &self,
        milestone_id: &MilestoneId,
        actor: &ActorId,
        amount: Amount,
        currency: &Currency,
    ) -> Result<Milestone, EscrowError> {
        let lock = self.milestone_lock(milestone_id);
        let _guard = lock
            .try_lock()
            .ok_or(EscrowError::ConcurrentModification {
                milestone: *milestone_id,
            })?;

        let milestone = self.milestones.get(milestone_id)?;
        let project = self.projects.get(&milestone.project)?;
        if !project.is_client(actor) {
            return Err(EscrowError::Unauthorized {
                actor: actor.to_string(),
                operation: format!("fund milestone {milestone_id}"),
            });
        }
        if amount != milestone.amount {
            return Err(EscrowError::Validation {
                reason: format!(
                    "funding amount {} does not match milestone amount {}",
                    amount.minor_units(),
                    milestone.amount.minor_units()
                ),
            });
        }
        if *currency != milestone.currency {
            return Err(EscrowError::Validation {
                reason: format!(
                    "funding currency {currency} does not match milestone currency {}",
                    milestone.currency
                ),
            });
        }
        ensure_transition(&milestone, MilestoneStatus::Funded)?;

        let draft = EntryDraft {
            project: Some(milestone.project),
            milestone: Some(milestone.id),
            debit: Account::wallet(project.client.clone()),
            credit: Account::escrow_holding(milestone.project, milestone.id),
            amount: milestone.amount,
            currency: milestone.currency.clone(),
            reference: None,
        };
        draft.validate()?;

        // The debit is the last step that can reject; everything after it
        // is pre-validated and runs under the milestone lock.
        self.wallets
            .debit_available(&project.client, &milestone.currency, milestone.amount)?;
        self.journal.append(draft)?;
        let updated = self.milestones.set_status(milestone_id, MilestoneStatus::Funded)?;
        info!(
            milestone = %milestone_id,
            project = %milestone.project,
            amount = milestone.amount.minor_units(),
            currency = %milestone.currency,
            "milestone funded"
        );
        Ok(updated)
    }

    /// Release a funded milestone's amount to the consultant and move the
    /// milestone to `RELEASED`.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] unless the authority may release,
    /// [`EscrowError::InvalidStateTransition`] unless the milestone is
    /// `FUNDED`.
    pub fn release(
        &self,
        milestone_id: &MilestoneId,
        authority: &ReleaseAuthority,
    ) -> Result<Milestone, EscrowError> {
        self.pay_out(
            milestone_id,
            authority,
            MilestoneStatus::Released,
            Payee::Consultant,
        )
    }

    /// Return a funded milestone's amount to the client and move the
    /// milestone to `REFUNDED`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`release`](Self::release).
    pub fn refund(
        &self,
        milestone_id: &MilestoneId,
        authority: &ReleaseAuthority,
    ) -> Result<Milestone, EscrowError> {
        self.pay_out(
            milestone_id,
            authority,
            MilestoneStatus::Refunded,
            Payee::Client,
        )
    }

    /// Open a dispute over a funded milestone. Moves no funds; the
    /// milestone transitions to `DISPUTED`, which blocks release and
    /// refund until resolution. Any project participant may open.
    ///
    /// At most one dispute ever exists per milestone: a second attempt
    /// sees `DISPUTED` and is rejected by the transition table.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Validation`] for an empty reason,
    /// [`EscrowError::Unauthorized`] for non-participants,
    /// [`EscrowError::InvalidStateTransition`] unless the milestone is
    /// `FUNDED`.
    pub fn open_dispute(
        &self,
        milestone_id: &MilestoneId,
        opened_by: &ActorId,
        reason: impl Into<String>,
    ) -> Result<Dispute, EscrowError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(EscrowError::Validation {
                reason: "dispute reason must not be empty".to_string(),
            });
        }

        let lock = self.milestone_lock(milestone_id);
        let _guard = lock
            .try_lock()
            .ok_or(EscrowError::ConcurrentModification {
                milestone: *milestone_id,
            })?;

        let milestone = self.milestones.get(milestone_id)?;
        let project = self.projects.get(&milestone.project)?;
        if !project.is_participant(opened_by) {
            return Err(EscrowError::Unauthorized {
                actor: opened_by.to_string(),
                operation: format!("open a dispute on milestone {milestone_id}"),
            });
        }
        ensure_transition(&milestone, MilestoneStatus::Disputed)?;

        let dispute = Dispute::open(milestone.project, milestone.id, opened_by.clone(), reason);
        self.milestones
            .set_status(milestone_id, MilestoneStatus::Disputed)?;
        self.disputes.insert(dispute.id, dispute.clone());
        self.dispute_index.insert(*milestone_id, dispute.id);
        info!(
            dispute = %dispute.id,
            milestone = %milestone_id,
            opened_by = %opened_by,
            "dispute opened"
        );
        Ok(dispute)
    }

    /// Resolve an open dispute: compute the settlement for the milestone
    /// amount, pay both parts out of the escrow-holding account, and move
    /// the milestone to `RESOLVED`. Only a project administrator may
    /// adjudicate. Returns the settlement.
    ///
    /// # Errors
    ///
    /// [`EscrowError::DisputeNotFound`] for unknown disputes,
    /// [`EscrowError::InvalidStateTransition`] if already resolved,
    /// [`EscrowError::Unauthorized`] for non-administrators.
    pub fn resolve_dispute(
        &self,
        dispute_id: &DisputeId,
        adjudicator: &ActorId,
        outcome: DisputeOutcome,
        notes: Option<String>,
    ) -> Result<Settlement, EscrowError> {
        let dispute = self
            .disputes
            .get(dispute_id)
            .ok_or(EscrowError::DisputeNotFound(*dispute_id))?;

        let lock = self.milestone_lock(&dispute.milestone);
        let _guard = lock
            .try_lock()
            .ok_or(EscrowError::ConcurrentModification {
                milestone: dispute.milestone,
            })?;

        // Re-read under the lock; the first read was only to find the
        // milestone to lock on.
        let dispute = self
            .disputes
            .get(dispute_id)
            .ok_or(EscrowError::DisputeNotFound(*dispute_id))?;
        if !dispute.is_open() {
            return Err(EscrowError::InvalidStateTransition {
                entity: "dispute",
                from: dispute.status.as_str().to_string(),
                to: DisputeStatus::Resolved.as_str().to_string(),
                reason: "dispute is already resolved".to_string(),
            });
        }
        let project = self.projects.get(&dispute.project)?;
        if !project.may_adjudicate(adjudicator) {
            return Err(EscrowError::Unauthorized {
                actor: adjudicator.to_string(),
                operation: format!("resolve dispute {dispute_id}"),
            });
        }
        let milestone = self.milestones.get(&dispute.milestone)?;
        ensure_transition(&milestone, MilestoneStatus::Resolved)?;

        let settlement = resolver::settlement(milestone.amount, outcome);
        let escrow = Account::escrow_holding(milestone.project, milestone.id);
        let reference = Some(EntryReference::Dispute { dispute: dispute.id });

        // A zero part produces no posting; the other part carries the
        // full amount.
        if settlement.client_part.is_positive() {
            let draft = EntryDraft {
                project: Some(milestone.project),
                milestone: Some(milestone.id),
                debit: escrow.clone(),
                credit: Account::wallet(project.client.clone()),
                amount: settlement.client_part,
                currency: milestone.currency.clone(),
                reference: reference.clone(),
            };
            draft.validate()?;
            self.journal.append(draft)?;
            self.wallets
                .credit(&project.client, &milestone.currency, settlement.client_part)?;
        }
        if settlement.freelancer_part.is_positive() {
            let draft = EntryDraft {
                project: Some(milestone.project),
                milestone: Some(milestone.id),
                debit: escrow,
                credit: Account::wallet(project.consultant.clone()),
                amount: settlement.freelancer_part,
                currency: milestone.currency.clone(),
                reference,
            };
            draft.validate()?;
            self.journal.append(draft)?;
            self.wallets.credit(
                &project.consultant,
                &milestone.currency,
                settlement.freelancer_part,
            )?;
        }

        self.milestones
            .set_resolved(&dispute.milestone, outcome.into())?;
        let resolved_at = Timestamp::now();
        self.disputes.update(dispute_id, |d| {
            d.status = DisputeStatus::Resolved;
            d.outcome = Some(outcome);
            d.notes = notes;
            d.resolved_at = Some(resolved_at);
        });
        info!(
            dispute = %dispute_id,
            milestone = %dispute.milestone,
            %outcome,
            client_units = settlement.client_part.minor_units(),
            consultant_units = settlement.freelancer_part.minor_units(),
            "dispute resolved"
        );
        Ok(settlement)
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Current balances for an (owner, currency) pair; zero for unknown
    /// pairs.
    pub fn wallet_balance(&self, owner: &ActorId, currency: &Currency) -> WalletBalance {
        self.wallets.balance(owner, currency)
    }

    /// Retrieve a milestone by id.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::MilestoneNotFound`] for unknown ids.
    pub fn milestone(&self, id: &MilestoneId) -> Result<Milestone, EscrowError> {
        self.milestones.get(id)
    }

    /// Custody progress for a milestone, for display.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::MilestoneNotFound`] for unknown ids.
    pub fn progress(&self, id: &MilestoneId) -> Result<MilestoneProgress, EscrowError> {
        self.milestones.progress(id)
    }

    /// All milestones for a project, oldest first.
    pub fn milestones_for_project(&self, project: &ProjectId) -> Vec<Milestone> {
        self.milestones.for_project(project)
    }

    /// Retrieve a dispute by id.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::DisputeNotFound`] for unknown ids.
    pub fn dispute(&self, id: &DisputeId) -> Result<Dispute, EscrowError> {
        self.disputes
            .get(id)
            .ok_or(EscrowError::DisputeNotFound(*id))
    }

    /// The dispute ever opened on a milestone, if any.
    pub fn dispute_for_milestone(&self, milestone: &MilestoneId) -> Option<Dispute> {
        self.dispute_index
            .get(milestone)
            .and_then(|id| self.disputes.get(&id))
    }

    /// Journal postings for a project, in append order.
    pub fn ledger_for_project(&self, project: &ProjectId) -> Vec<LedgerEntry> {
        self.journal.postings_for_project(project).collect()
    }

    /// Journal postings for a milestone, in append order.
    pub fn ledger_for_milestone(&self, milestone: &MilestoneId) -> Vec<LedgerEntry> {
        self.journal.postings_for_milestone(milestone).collect()
    }

    /// Funds currently in a milestone's escrow-holding account, netted
    /// from the journal, in minor units.
    pub fn escrow_balance_units(
        &self,
        project: &ProjectId,
        milestone: &MilestoneId,
        currency: &Currency,
    ) -> i64 {
        self.journal
            .reconstruct_escrow_units(project, milestone, currency)
    }

    /// Replay the journal and compare it against a wallet's live balances.
    /// Logs a warning on divergence; the journal never overwrites the
    /// wallet store.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Core`] if the wallet total overflows.
    pub fn verify_wallet_against_journal(
        &self,
        owner: &ActorId,
        currency: &Currency,
    ) -> Result<JournalAudit, EscrowError> {
        let total = self.wallets.balance(owner, currency).total()?;
        let audit = JournalAudit {
            wallet_units: total.minor_units(),
            journal_units: self.journal.reconstruct_wallet_units(owner, currency),
        };
        if !audit.is_consistent() {
            warn!(
                %owner,
                %currency,
                wallet_units = audit.wallet_units,
                journal_units = audit.journal_units,
                "wallet diverges from journal replay"
            );
        }
        Ok(audit)
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Pay a funded milestone's full amount out of escrow to one party.
    /// Shared body of release and refund.
    fn pay_out(
        &self,
        milestone_id: &MilestoneId,
        authority: &ReleaseAuthority,
        next: MilestoneStatus,
        payee: Payee,
    ) -> Result<Milestone, EscrowError> {
        let lock = self.milestone_lock(milestone_id);
        let _guard = lock
            .try_lock()
            .ok_or(EscrowError::ConcurrentModification {
                milestone: *milestone_id,
            })?;

        let milestone = self.milestones.get(milestone_id)?;
        let project = self.projects.get(&milestone.project)?;
        if !project.may_release(authority) {
            return Err(EscrowError::Unauthorized {
                actor: authority_name(authority),
                operation: format!("{} milestone {milestone_id}", payee.operation()),
            });
        }
        ensure_transition(&milestone, next)?;

        let recipient = match payee {
            Payee::Client => &project.client,
            Payee::Consultant => &project.consultant,
        };
        let draft = EntryDraft {
            project: Some(milestone.project),
            milestone: Some(milestone.id),
            debit: Account::escrow_holding(milestone.project, milestone.id),
            credit: Account::wallet(recipient.clone()),
            amount: milestone.amount,
            currency: milestone.currency.clone(),
            reference: None,
        };
        draft.validate()?;

        self.journal.append(draft)?;
        self.wallets
            .credit(recipient, &milestone.currency, milestone.amount)?;
        let updated = self.milestones.set_status(milestone_id, next)?;
        info!(
            milestone = %milestone_id,
            project = %milestone.project,
            %recipient,
            amount = milestone.amount.minor_units(),
            status = %next,
            "escrow paid out"
        );
        Ok(updated)
    }

    /// The mutex guarding a milestone's business operations, created on
    /// first use and kept for the controller's lifetime.
    fn milestone_lock(&self, id: &MilestoneId) -> Arc<Mutex<()>> {
        self.locks.lock().entry(*id).or_default().clone()
    }
}

/// Which party a payout goes to.
#[derive(Debug, Clone, Copy)]
enum Payee {
    Client,
    Consultant,
}

impl Payee {
    fn operation(&self) -> &'static str {
        match self {
            Self::Client => "refund",
            Self::Consultant => "release",
        }
    }
}

fn ensure_transition(milestone: &Milestone, next: MilestoneStatus) -> Result<(), EscrowError> {
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
    Ok(())
}

fn authority_name(authority: &ReleaseAuthority) -> String {
    match authority {
        ReleaseAuthority::Admin { actor } => actor.to_string(),
        ReleaseAuthority::AutoRelease => "auto-release".to_string(),
    }
}
