//! # Dispute Settlement Computation
//!
//! Pure payout arithmetic, no side effects. Given the disputed amount and
//! the adjudicated outcome, compute how the escrow-holding balance divides
//! between the client and the consultant.
//!
//! ## Security Invariant
//!
//! `client_part + freelancer_part == amount` exactly, for every ratio and
//! every integer-cent amount. The client part is the only rounded quantity
//! (round-half-up at the smallest currency unit, via [`SplitRatio::apply`]);
//! the freelancer part is computed by subtraction, never by an independent
//! rounding, so no currency can leak or be minted at settlement.

use serde::{Deserialize, Serialize};

use escra_core::{Amount, SplitRatio};

use crate::dispute::DisputeOutcome;

/// The division of a disputed amount between the parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// The portion returning to the client.
    pub client_part: Amount,
    /// The portion paying out to the consultant.
    pub freelancer_part: Amount,
}

/// Compute the settlement for a disputed amount.
///
/// - `Refund`: the full amount returns to the client.
/// - `Release`: the full amount pays out to the consultant.
/// - `Split { ratio }`: the client receives `round_half_up(amount × ratio)`,
///   the consultant the remainder.
pub fn settlement(amount: Amount, outcome: DisputeOutcome) -> Settlement {
    let client_part = match outcome {
        DisputeOutcome::Refund => amount,
        DisputeOutcome::Release => Amount::ZERO,
        DisputeOutcome::Split { ratio } => ratio.apply(amount),
    };
    // ratio.apply never exceeds the amount, so the subtraction cannot fail;
    // computing the remainder by subtraction is what guarantees the sum
    // invariant.
    let freelancer_part = amount
        .checked_sub(client_part)
        .unwrap_or(Amount::ZERO);
    Settlement {
        client_part,
        freelancer_part,
    }
}

/// Convenience for callers holding a bare ratio.
pub fn split(amount: Amount, ratio: SplitRatio) -> Settlement {
    settlement(amount, DisputeOutcome::Split { ratio })
}
