//! # Ledger Error Types
//!
//! Structured errors for wallet and journal operations. Every variant
//! carries enough context for operators to diagnose the failure without
//! inspecting logs: the wallet touched, the amounts involved, and the
//! operation that was rejected.

use thiserror::Error;

use escra_core::CoreError;

/// Errors arising from wallet and journal operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A posting or wallet operation was malformed.
    #[error("ledger validation failed: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: String,
    },

    /// Wallet available balance is too low for the requested debit or hold.
    #[error(
        "insufficient funds in wallet {owner}/{currency}: requested {requested}, available {available}"
    )]
    InsufficientFunds {
        /// The wallet owner.
        owner: String,
        /// The wallet currency.
        currency: String,
        /// The requested amount (smallest units).
        requested: i64,
        /// The available balance (smallest units).
        available: i64,
    },

    /// Wallet held balance does not cover the requested release or payout.
    #[error(
        "wallet {owner}/{currency} cannot perform {operation}: requested {requested}, held {held}"
    )]
    InvalidState {
        /// The wallet owner.
        owner: String,
        /// The wallet currency.
        currency: String,
        /// The attempted operation (e.g., "release_hold", "debit_held").
        operation: String,
        /// The requested amount (smallest units).
        requested: i64,
        /// The held balance (smallest units).
        held: i64,
    },

    /// Domain-primitive failure surfaced during a ledger operation
    /// (arithmetic overflow, malformed amount).
    #[error("ledger domain error: {0}")]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = LedgerError::Validation {
            reason: "debit and credit accounts are identical".to_string(),
        };
        assert!(format!("{err}").contains("identical"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = LedgerError::InsufficientFunds {
            owner: "client-c1".to_string(),
            currency: "USD".to_string(),
            requested: 50_000,
            available: 10_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("client-c1"));
        assert!(msg.contains("50000"));
        assert!(msg.contains("10000"));
    }

    #[test]
    fn invalid_state_display() {
        let err = LedgerError::InvalidState {
            owner: "consultant-f1".to_string(),
            currency: "EUR".to_string(),
            operation: "debit_held".to_string(),
            requested: 500,
            held: 0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("debit_held"));
        assert!(msg.contains("consultant-f1"));
    }

    #[test]
    fn core_error_converts() {
        let err: LedgerError = CoreError::AmountOverflow("x".to_string()).into();
        assert!(matches!(err, LedgerError::Core(_)));
    }
}
