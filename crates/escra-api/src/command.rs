//! # Command Surface
//!
//! The serde contract a transport layer (HTTP handler, message consumer,
//! CLI) drives the custody core with. [`Command`] is a tagged enum of
//! every operation; [`CommandExecutor`] dispatches a command against an
//! [`EscrowController`] and answers with a [`CommandReply`] view or an
//! [`ApiError`].
//!
//! Amounts arrive as integer minor units and ratios as floats; float
//! ratios are quantized to basis points exactly once, here at the
//! boundary. No float ever reaches the settlement arithmetic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use escra_core::{
    ActorId, Amount, Currency, DisputeId, MilestoneId, ProjectId, SplitRatio, Timestamp,
};
use escra_escrow::{DisputeOutcome, EscrowController, ReleaseAuthority};

use crate::error::ApiError;
use crate::view::{
    DisputeView, LedgerEntryView, MilestoneView, ProjectView, SettlementView, WalletBalanceView,
};

/// A requested dispute outcome, as clients express it.
///
/// The split ratio is a float in `[0.0, 1.0]` (the client's share) and is
/// quantized to basis points during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeSpec {
    /// The full amount returns to the client.
    Refund,
    /// The full amount pays out to the consultant.
    Release,
    /// The amount splits between the parties.
    Split {
        /// The client's share, `0.0..=1.0`.
        ratio: f64,
    },
}

impl OutcomeSpec {
    /// Convert to the domain outcome, validating the ratio.
    ///
    /// # Errors
    ///
    /// Returns a validation [`ApiError`] for a non-finite or out-of-range
    /// ratio.
    pub fn into_outcome(self) -> Result<DisputeOutcome, ApiError> {
        Ok(match self {
            Self::Refund => DisputeOutcome::Refund,
            Self::Release => DisputeOutcome::Release,
            Self::Split { ratio } => DisputeOutcome::Split {
                ratio: SplitRatio::from_ratio(ratio)
                    .map_err(|e| ApiError::validation(e.to_string()))?,
            },
        })
    }
}

/// Every operation the command surface accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Register a project with its participants.
    RegisterProject {
        /// The paying client.
        client: ActorId,
        /// The assigned consultant.
        consultant: ActorId,
        /// Administrators authorized to adjudicate and release.
        #[serde(default)]
        admins: Vec<ActorId>,
    },
    /// Create a milestone in `PENDING` status.
    CreateMilestone {
        /// The owning project.
        project: ProjectId,
        /// Human-readable title.
        title: String,
        /// The payment amount, in minor units.
        amount: Amount,
        /// The settlement currency.
        currency: Currency,
        /// Agreed completion date, if any.
        #[serde(default)]
        due_date: Option<Timestamp>,
    },
    /// Credit external value into a wallet.
    Deposit {
        /// The wallet owner.
        owner: ActorId,
        /// The wallet currency.
        currency: Currency,
        /// The amount, in minor units.
        amount: Amount,
    },
    /// Fund a milestone from the client's wallet.
    Fund {
        /// The milestone to fund.
        milestone: MilestoneId,
        /// The acting client.
        actor: ActorId,
        /// The amount the caller believes it is funding, in minor units.
        /// Must match the milestone record exactly.
        amount: Amount,
        /// The funding currency. Must match the milestone record.
        currency: Currency,
    },
    /// Release a funded milestone's amount to the consultant.
    Release {
        /// The milestone to release.
        milestone: MilestoneId,
        /// Who authorizes the release.
        authority: ReleaseAuthority,
    },
    /// Return a funded milestone's amount to the client.
    Refund {
        /// The milestone to refund.
        milestone: MilestoneId,
        /// Who authorizes the refund.
        authority: ReleaseAuthority,
    },
    /// Open a dispute over a funded milestone.
    OpenDispute {
        /// The disputed milestone.
        milestone: MilestoneId,
        /// The project participant opening the dispute.
        opened_by: ActorId,
        /// The stated reason.
        reason: String,
    },
    /// Resolve an open dispute with an adjudicated outcome.
    ResolveDispute {
        /// The dispute to resolve.
        dispute: DisputeId,
        /// The adjudicating administrator.
        adjudicator: ActorId,
        /// The adjudicated outcome.
        outcome: OutcomeSpec,
        /// Optional adjudicator notes.
        #[serde(default)]
        notes: Option<String>,
    },
    /// Read a wallet's balances.
    GetWalletBalance {
        /// The wallet owner.
        owner: ActorId,
        /// The wallet currency.
        currency: Currency,
    },
    /// Read a milestone with its custody progress.
    GetMilestone {
        /// The milestone to read.
        milestone: MilestoneId,
    },
    /// Read journal postings for a project or a single milestone, in
    /// append order.
    GetLedger {
        /// Which slice of the journal to read.
        #[serde(flatten)]
        selector: LedgerSelector,
    },
}

/// Selects the journal slice a `get_ledger` read returns.
///
/// On the wire this is a plain `project` or `milestone` field on the
/// command, whichever the caller supplies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerSelector {
    /// Every posting touching the project.
    Project {
        /// The project to read.
        project: ProjectId,
    },
    /// Every posting touching one milestone.
    Milestone {
        /// The milestone to read.
        milestone: MilestoneId,
    },
}

impl Command {
    /// The command name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterProject { .. } => "register_project",
            Self::CreateMilestone { .. } => "create_milestone",
            Self::Deposit { .. } => "deposit",
            Self::Fund { .. } => "fund",
            Self::Release { .. } => "release",
            Self::Refund { .. } => "refund",
            Self::OpenDispute { .. } => "open_dispute",
            Self::ResolveDispute { .. } => "resolve_dispute",
            Self::GetWalletBalance { .. } => "get_wallet_balance",
            Self::GetMilestone { .. } => "get_milestone",
            Self::GetLedger { .. } => "get_ledger",
        }
    }
}

/// A successful command's answer, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandReply {
    /// A project record.
    Project {
        /// The registered project.
        project: ProjectView,
    },
    /// A milestone record with custody progress.
    Milestone {
        /// The milestone after the operation.
        milestone: MilestoneView,
    },
    /// A dispute record.
    Dispute {
        /// The opened dispute.
        dispute: DisputeView,
    },
    /// A dispute settlement.
    Settlement {
        /// How the disputed amount divided.
        settlement: SettlementView,
    },
    /// Wallet balances.
    WalletBalance {
        /// The balances after the operation.
        balance: WalletBalanceView,
    },
    /// Journal postings, in append order.
    Ledger {
        /// The postings.
        postings: Vec<LedgerEntryView>,
    },
}

/// Dispatches commands against an [`EscrowController`].
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    controller: EscrowController,
}

impl CommandExecutor {
    /// Create an executor over a controller handle.
    pub fn new(controller: EscrowController) -> Self {
        Self { controller }
    }

    /// The underlying controller handle.
    pub fn controller(&self) -> &EscrowController {
        &self.controller
    }

    /// Execute one command.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] carrying the code and message for any
    /// domain rejection.
    pub fn execute(&self, command: Command) -> Result<CommandReply, ApiError> {
        debug!(command = command.name(), "executing command");
        match command {
            Command::RegisterProject {
                client,
                consultant,
                admins,
            } => {
                let project = self.controller.register_project(client, consultant, admins)?;
                Ok(CommandReply::Project {
                    project: ProjectView::from(&project),
                })
            }
            Command::CreateMilestone {
                project,
                title,
                amount,
                currency,
                due_date,
            } => {
                let milestone = self
                    .controller
                    .create_milestone(&project, title, amount, currency, due_date)?;
                self.milestone_reply(&milestone.id)
            }
            Command::Deposit {
                owner,
                currency,
                amount,
            } => {
                let balance = self.controller.deposit(&owner, &currency, amount)?;
                Ok(CommandReply::WalletBalance {
                    balance: WalletBalanceView::from_parts(
                        owner.as_str(),
                        currency.as_str(),
                        balance,
                    ),
                })
            }
            Command::Fund {
                milestone,
                actor,
                amount,
                currency,
            } => {
                self.controller.fund(&milestone, &actor, amount, &currency)?;
                self.milestone_reply(&milestone)
            }
            Command::Release {
                milestone,
                authority,
            } => {
                self.controller.release(&milestone, &authority)?;
                self.milestone_reply(&milestone)
            }
            Command::Refund {
                milestone,
                authority,
            } => {
                self.controller.refund(&milestone, &authority)?;
                self.milestone_reply(&milestone)
            }
            Command::OpenDispute {
                milestone,
                opened_by,
                reason,
            } => {
                let dispute = self
                    .controller
                    .open_dispute(&milestone, &opened_by, reason)?;
                Ok(CommandReply::Dispute {
                    dispute: DisputeView::from(&dispute),
                })
            }
            Command::ResolveDispute {
                dispute,
                adjudicator,
                outcome,
                notes,
            } => {
                let outcome = outcome.into_outcome()?;
                let settlement =
                    self.controller
                        .resolve_dispute(&dispute, &adjudicator, outcome, notes)?;
                Ok(CommandReply::Settlement {
                    settlement: SettlementView::from(settlement),
                })
            }
            Command::GetWalletBalance { owner, currency } => {
                let balance = self.controller.wallet_balance(&owner, &currency);
                Ok(CommandReply::WalletBalance {
                    balance: WalletBalanceView::from_parts(
                        owner.as_str(),
                        currency.as_str(),
                        balance,
                    ),
                })
            }
            Command::GetMilestone { milestone } => self.milestone_reply(&milestone),
            Command::GetLedger { selector } => {
                let entries = match selector {
                    LedgerSelector::Project { project } => {
                        self.controller.ledger_for_project(&project)
                    }
                    LedgerSelector::Milestone { milestone } => {
                        self.controller.ledger_for_milestone(&milestone)
                    }
                };
                let postings = entries.iter().map(LedgerEntryView::from).collect();
                Ok(CommandReply::Ledger { postings })
            }
        }
    }

    fn milestone_reply(&self, id: &MilestoneId) -> Result<CommandReply, ApiError> {
        let milestone = self.controller.milestone(id)?;
        let progress = self.controller.progress(id)?;
        Ok(CommandReply::Milestone {
            milestone: MilestoneView::from_parts(&milestone, progress.percent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use escra_escrow::MilestoneStatus;

    fn actor(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn amt(units: i64) -> Amount {
        Amount::from_minor_units(units).unwrap()
    }

    fn executor_with_funded_milestone() -> (CommandExecutor, ProjectId, MilestoneId) {
        let executor = CommandExecutor::new(EscrowController::new());
        let project = executor
            .controller()
            .register_project(
                actor("client-c1"),
                actor("consultant-f1"),
                [actor("admin-a1")],
            )
            .unwrap();
        executor
            .controller()
            .deposit(&actor("client-c1"), &usd(), amt(100_000))
            .unwrap();
        let milestone = executor
            .controller()
            .create_milestone(&project.id, "Design phase", amt(50_000), usd(), None)
            .unwrap();
        executor
            .controller()
            .fund(&milestone.id, &actor("client-c1"), amt(50_000), &usd())
            .unwrap();
        (executor, project.id, milestone.id)
    }

    #[test]
    fn command_deserializes_from_tagged_json() {
        let json = format!(
            "{{\"command\":\"fund\",\"milestone\":\"{}\",\"actor\":\"client-c1\",\
             \"amount\":50000,\"currency\":\"USD\"}}",
            serde_json::to_value(MilestoneId::new()).unwrap().as_str().unwrap()
        );
        let command: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(command.name(), "fund");
    }

    #[test]
    fn get_ledger_accepts_either_selector_field() {
        let project = serde_json::to_value(ProjectId::new()).unwrap();
        let by_project: Command = serde_json::from_value(serde_json::json!({
            "command": "get_ledger",
            "project": project,
        }))
        .unwrap();
        assert!(matches!(
            by_project,
            Command::GetLedger {
                selector: LedgerSelector::Project { .. }
            }
        ));

        let milestone = serde_json::to_value(MilestoneId::new()).unwrap();
        let by_milestone: Command = serde_json::from_value(serde_json::json!({
            "command": "get_ledger",
            "milestone": milestone,
        }))
        .unwrap();
        assert!(matches!(
            by_milestone,
            Command::GetLedger {
                selector: LedgerSelector::Milestone { .. }
            }
        ));
    }

    #[test]
    fn outcome_spec_quantizes_ratio() {
        let outcome = OutcomeSpec::Split { ratio: 0.4 }.into_outcome().unwrap();
        match outcome {
            DisputeOutcome::Split { ratio } => assert_eq!(ratio.basis_points(), 4_000),
            other => panic!("unexpected outcome {other}"),
        }
    }

    #[test]
    fn outcome_spec_rejects_bad_ratios() {
        assert!(OutcomeSpec::Split { ratio: 1.5 }.into_outcome().is_err());
        assert!(OutcomeSpec::Split { ratio: -0.1 }.into_outcome().is_err());
        assert!(OutcomeSpec::Split {
            ratio: f64::INFINITY
        }
        .into_outcome()
        .is_err());
    }

    #[test]
    fn release_command_answers_with_milestone_view() {
        let (executor, _, milestone) = executor_with_funded_milestone();
        let reply = executor
            .execute(Command::Release {
                milestone,
                authority: ReleaseAuthority::Admin {
                    actor: actor("admin-a1"),
                },
            })
            .unwrap();
        match reply {
            CommandReply::Milestone { milestone } => {
                assert_eq!(milestone.status, MilestoneStatus::Released);
                assert_eq!(milestone.progress_percent, 100);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn dispute_round_trip_through_commands() {
        let (executor, _, milestone) = executor_with_funded_milestone();
        let reply = executor
            .execute(Command::OpenDispute {
                milestone,
                opened_by: actor("client-c1"),
                reason: "partial delivery".to_string(),
            })
            .unwrap();
        let dispute_id = match reply {
            CommandReply::Dispute { dispute } => dispute.id,
            other => panic!("unexpected reply {other:?}"),
        };
        // The view renders the prefixed form; recover the raw uuid.
        let raw = dispute_id.strip_prefix("dispute:").unwrap();
        let dispute = DisputeId::from_uuid(raw.parse().unwrap());

        let reply = executor
            .execute(Command::ResolveDispute {
                dispute,
                adjudicator: actor("admin-a1"),
                outcome: OutcomeSpec::Split { ratio: 0.4 },
                notes: None,
            })
            .unwrap();
        match reply {
            CommandReply::Settlement { settlement } => {
                assert_eq!(settlement.client_part_units, 20_000);
                assert_eq!(settlement.freelancer_part_units, 30_000);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn domain_rejections_surface_as_api_errors() {
        let (executor, _, milestone) = executor_with_funded_milestone();
        let err = executor
            .execute(Command::Fund {
                milestone,
                actor: actor("client-c1"),
                amount: amt(50_000),
                currency: usd(),
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(err.code.suggested_http_status(), 409);
    }

    #[test]
    fn fund_with_the_wrong_amount_is_a_validation_error() {
        let executor = CommandExecutor::new(EscrowController::new());
        let project = executor
            .controller()
            .register_project(actor("client-c1"), actor("consultant-f1"), [])
            .unwrap();
        executor
            .controller()
            .deposit(&actor("client-c1"), &usd(), amt(100_000))
            .unwrap();
        let milestone = executor
            .controller()
            .create_milestone(&project.id, "Design phase", amt(50_000), usd(), None)
            .unwrap();
        let err = executor
            .execute(Command::Fund {
                milestone: milestone.id,
                actor: actor("client-c1"),
                amount: amt(40_000),
                currency: usd(),
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.code.suggested_http_status(), 422);
    }

    #[test]
    fn get_ledger_lists_postings_in_order() {
        let (executor, project, _) = executor_with_funded_milestone();
        let reply = executor
            .execute(Command::GetLedger {
                selector: LedgerSelector::Project { project },
            })
            .unwrap();
        match reply {
            CommandReply::Ledger { postings } => {
                assert_eq!(postings.len(), 1);
                assert!(postings[0].credit.starts_with("escrow:"));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn get_ledger_narrows_to_one_milestone() {
        let (executor, project, milestone) = executor_with_funded_milestone();
        let other = executor
            .controller()
            .create_milestone(&project, "Build phase", amt(10_000), usd(), None)
            .unwrap();
        executor
            .controller()
            .fund(&other.id, &actor("client-c1"), amt(10_000), &usd())
            .unwrap();

        let reply = executor
            .execute(Command::GetLedger {
                selector: LedgerSelector::Milestone { milestone },
            })
            .unwrap();
        match reply {
            CommandReply::Ledger { postings } => {
                assert_eq!(postings.len(), 1);
                assert_eq!(postings[0].amount_units, 50_000);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn get_wallet_balance_for_unknown_wallet_is_zero() {
        let executor = CommandExecutor::new(EscrowController::new());
        let reply = executor
            .execute(Command::GetWalletBalance {
                owner: actor("ghost"),
                currency: usd(),
            })
            .unwrap();
        match reply {
            CommandReply::WalletBalance { balance } => {
                assert_eq!(balance.available_units, 0);
                assert_eq!(balance.held_units, 0);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn reply_serializes_with_result_tag() {
        let (executor, _, milestone) = executor_with_funded_milestone();
        let reply = executor.execute(Command::GetMilestone { milestone }).unwrap();
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("\"result\":\"milestone\""));
        assert!(json.contains("\"FUNDED\""));
    }
}
