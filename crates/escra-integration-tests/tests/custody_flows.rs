//! # End-to-End Custody Flows
//!
//! Full scenarios across the custody stack: deposits enter through the
//! controller, milestones move through the state machine, and every
//! wallet balance reconciles against a journal replay at the end.

use escra_core::{ActorId, Amount, Currency, SplitRatio};
use escra_escrow::{
    DisputeOutcome, EscrowController, Milestone, MilestoneStatus, Project, ReleaseAuthority,
};

fn actor(s: &str) -> ActorId {
    ActorId::new(s).unwrap()
}

fn usd() -> Currency {
    Currency::new("USD").unwrap()
}

fn amt(units: i64) -> Amount {
    Amount::from_minor_units(units).unwrap()
}

fn admin() -> ReleaseAuthority {
    ReleaseAuthority::Admin {
        actor: actor("admin-a1"),
    }
}

/// Client with 1000.00 USD on deposit and a 500.00 USD milestone.
fn scenario() -> (EscrowController, Project, Milestone) {
    let controller = EscrowController::new();
    let project = controller
        .register_project(
            actor("client-c1"),
            actor("consultant-f1"),
            [actor("admin-a1")],
        )
        .unwrap();
    controller
        .deposit(&project.client, &usd(), amt(100_000))
        .unwrap();
    let milestone = controller
        .create_milestone(&project.id, "Design phase", amt(50_000), usd(), None)
        .unwrap();
    (controller, project, milestone)
}

/// Assert every wallet and the escrow account reconcile against the
/// journal, and that the total in the system equals what was deposited.
fn assert_conservation(
    controller: &EscrowController,
    project: &Project,
    milestone: &Milestone,
    deposited_units: i64,
) {
    let mut in_system = 0;
    for owner in [&project.client, &project.consultant] {
        let audit = controller
            .verify_wallet_against_journal(owner, &usd())
            .unwrap();
        assert!(
            audit.is_consistent(),
            "wallet {owner} diverged: store {} vs journal {}",
            audit.wallet_units,
            audit.journal_units
        );
        in_system += audit.wallet_units;
    }
    in_system += controller.escrow_balance_units(&project.id, &milestone.id, &usd());
    assert_eq!(
        in_system, deposited_units,
        "value was minted or destroyed somewhere in the flow"
    );
}

#[test]
fn happy_path_fund_then_release() {
    let (controller, project, milestone) = scenario();

    // 1. Fund: 500.00 leaves the client's available balance for escrow.
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();
    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(50_000)
    );
    assert_eq!(
        controller.escrow_balance_units(&project.id, &milestone.id, &usd()),
        50_000
    );
    assert_eq!(
        controller.milestone(&milestone.id).unwrap().status,
        MilestoneStatus::Funded
    );

    // 2. Release: escrow pays out to the consultant in full.
    controller.release(&milestone.id, &admin()).unwrap();
    assert_eq!(
        controller
            .wallet_balance(&project.consultant, &usd())
            .available,
        amt(50_000)
    );
    assert_eq!(
        controller.escrow_balance_units(&project.id, &milestone.id, &usd()),
        0
    );

    // 3. Two postings tell the whole story, in order.
    let postings = controller.ledger_for_milestone(&milestone.id);
    assert_eq!(postings.len(), 2);
    assert!(postings[0].credit.to_string().starts_with("escrow:"));
    assert!(postings[1].debit.to_string().starts_with("escrow:"));

    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn fund_then_refund_restores_the_client() {
    let (controller, project, milestone) = scenario();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();
    controller.refund(&milestone.id, &admin()).unwrap();

    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(100_000)
    );
    assert_eq!(
        controller.milestone(&milestone.id).unwrap().status,
        MilestoneStatus::Refunded
    );
    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn disputed_split_settles_exactly() {
    let (controller, project, milestone) = scenario();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();

    let dispute = controller
        .open_dispute(&milestone.id, &project.consultant, "scope disagreement")
        .unwrap();
    let settlement = controller
        .resolve_dispute(
            &dispute.id,
            &actor("admin-a1"),
            DisputeOutcome::Split {
                ratio: SplitRatio::from_ratio(0.4).unwrap(),
            },
            Some("40/60 per the contract".to_string()),
        )
        .unwrap();

    // 500.00 at 0.4 → client 200.00 back, consultant 300.00 out.
    assert_eq!(settlement.client_part, amt(20_000));
    assert_eq!(settlement.freelancer_part, amt(30_000));
    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(70_000)
    );
    assert_eq!(
        controller
            .wallet_balance(&project.consultant, &usd())
            .available,
        amt(30_000)
    );
    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn double_funding_changes_nothing() {
    let (controller, project, milestone) = scenario();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap_err();

    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(50_000)
    );
    assert_eq!(controller.ledger_for_milestone(&milestone.id).len(), 1);
    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn rejected_operations_leave_no_journal_trace() {
    let (controller, project, milestone) = scenario();

    // Release before funding, dispute before funding, stranger funding:
    // all rejected, none journaled.
    controller.release(&milestone.id, &admin()).unwrap_err();
    controller
        .open_dispute(&milestone.id, &project.client, "premature")
        .unwrap_err();
    controller
        .fund(&milestone.id, &actor("mallory"), milestone.amount, &milestone.currency)
        .unwrap_err();

    assert!(controller.ledger_for_milestone(&milestone.id).is_empty());
    assert_eq!(
        controller.milestone(&milestone.id).unwrap().status,
        MilestoneStatus::Pending
    );
    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn two_milestones_share_one_wallet() {
    let (controller, project, first) = scenario();
    let second = controller
        .create_milestone(&project.id, "Build phase", amt(40_000), usd(), None)
        .unwrap();

    controller
        .fund(&first.id, &project.client, first.amount, &first.currency)
        .unwrap();
    controller
        .fund(&second.id, &project.client, second.amount, &second.currency)
        .unwrap();
    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(10_000)
    );

    // A third milestone the remaining balance cannot cover.
    let third = controller
        .create_milestone(&project.id, "Launch phase", amt(20_000), usd(), None)
        .unwrap();
    controller
        .fund(&third.id, &project.client, third.amount, &third.currency)
        .unwrap_err();

    controller.release(&first.id, &admin()).unwrap();
    controller.refund(&second.id, &admin()).unwrap();

    assert_eq!(
        controller.wallet_balance(&project.client, &usd()).available,
        amt(50_000)
    );
    assert_eq!(
        controller
            .wallet_balance(&project.consultant, &usd())
            .available,
        amt(50_000)
    );
    assert_eq!(controller.milestones_for_project(&project.id).len(), 3);
}

#[test]
fn dispute_blocks_payout_until_resolution() {
    let (controller, project, milestone) = scenario();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();
    let dispute = controller
        .open_dispute(&milestone.id, &project.client, "deliverable rejected")
        .unwrap();

    controller.release(&milestone.id, &admin()).unwrap_err();
    controller.refund(&milestone.id, &admin()).unwrap_err();

    controller
        .resolve_dispute(&dispute.id, &actor("admin-a1"), DisputeOutcome::Release, None)
        .unwrap();
    // Terminal: nothing further is possible.
    controller.release(&milestone.id, &admin()).unwrap_err();
    controller
        .open_dispute(&milestone.id, &project.client, "again")
        .unwrap_err();

    assert_eq!(
        controller
            .wallet_balance(&project.consultant, &usd())
            .available,
        amt(50_000)
    );
    assert_conservation(&controller, &project, &milestone, 100_000);
}

#[test]
fn journal_replay_reproduces_every_balance() {
    let (controller, project, milestone) = scenario();
    controller
        .fund(&milestone.id, &project.client, milestone.amount, &milestone.currency)
        .unwrap();
    let dispute = controller
        .open_dispute(&milestone.id, &project.client, "contested")
        .unwrap();
    controller
        .resolve_dispute(
            &dispute.id,
            &actor("admin-a1"),
            DisputeOutcome::Split {
                ratio: SplitRatio::from_basis_points(1).unwrap(),
            },
            None,
        )
        .unwrap();

    // Replaying the journal from empty state matches the live stores,
    // including the one-minor-unit client part the split produced.
    let journal = controller.ledger_for_project(&project.id);
    assert_eq!(journal.len(), 3);
    for owner in [&project.client, &project.consultant] {
        let audit = controller
            .verify_wallet_against_journal(owner, &usd())
            .unwrap();
        assert!(audit.is_consistent());
    }
}
