//! # Wallet Store
//!
//! Per-(owner, currency) balances, split into *available* (spendable) and
//! *held* (earmarked, unavailable for new commitments). The wallet store is
//! the live source of truth for balance reads; the journal provides the
//! independent history it can be verified against.
//!
//! ## Security Invariant
//!
//! Both balances are non-negative at all times. Every mutation is an atomic
//! check-and-mutate under one write lock ([`Store::try_upsert_with`]), so a
//! balance can never be observed mid-operation or driven negative by a
//! concurrent debit. Wallets are created on first reference and never
//! deleted, only zeroed.

use serde::{Deserialize, Serialize};

use escra_core::{ActorId, Amount, Currency};

use crate::error::LedgerError;
use crate::store::Store;

/// A single wallet: one owner, one currency, two balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// The wallet owner.
    pub owner: ActorId,
    /// The wallet currency.
    pub currency: Currency,
    /// Funds spendable on new commitments.
    pub available: Amount,
    /// Funds earmarked and unavailable for new commitments.
    pub held: Amount,
}

impl Wallet {
    fn empty(owner: ActorId, currency: Currency) -> Self {
        Self {
            owner,
            currency,
            available: Amount::ZERO,
            held: Amount::ZERO,
        }
    }

    /// The wallet's balances as a read-only pair.
    pub fn balance(&self) -> WalletBalance {
        WalletBalance {
            available: self.available,
            held: self.held,
        }
    }
}

/// A point-in-time view of a wallet's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Funds spendable on new commitments.
    pub available: Amount,
    /// Funds earmarked and unavailable for new commitments.
    pub held: Amount,
}

impl WalletBalance {
    /// The zero balance reported for unknown (owner, currency) pairs.
    pub const ZERO: WalletBalance = WalletBalance {
        available: Amount::ZERO,
        held: Amount::ZERO,
    };

    /// Total funds in the wallet (available + held).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Core`] on arithmetic overflow.
    pub fn total(&self) -> Result<Amount, LedgerError> {
        Ok(self.available.checked_add(self.held)?)
    }
}

/// Thread-safe store of wallets keyed by (owner, currency).
///
/// Mutations for the same (owner, currency) pair are serialized by the
/// store's write lock. No component caches balances independently of this
/// store.
#[derive(Debug, Clone, Default)]
pub struct WalletStore {
    wallets: Store<(ActorId, Currency), Wallet>,
}

impl WalletStore {
    /// Create an empty wallet store.
    pub fn new() -> Self {
        Self {
            wallets: Store::new(),
        }
    }

    /// Current balances for an (owner, currency) pair.
    ///
    /// Never fails; unknown pairs report [`WalletBalance::ZERO`].
    pub fn balance(&self, owner: &ActorId, currency: &Currency) -> WalletBalance {
        self.wallets
            .get(&(owner.clone(), currency.clone()))
            .map(|w| w.balance())
            .unwrap_or(WalletBalance::ZERO)
    }

    /// Increase the available balance. Creates the wallet on first
    /// reference. Never fails for a representable amount except on
    /// arithmetic overflow; a zero credit is a no-op that still creates
    /// the wallet.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Core`] on overflow.
    pub fn credit(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, LedgerError> {
        self.mutate(owner, currency, |wallet| {
            wallet.available = wallet.available.checked_add(amount)?;
            Ok(())
        })
    }

    /// Decrease the available balance (funds leave the wallet outright).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] if available is short.
    pub fn debit_available(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, LedgerError> {
        require_positive("debit_available", amount)?;
        self.mutate(owner, currency, |wallet| {
            if amount > wallet.available {
                return Err(LedgerError::InsufficientFunds {
                    owner: wallet.owner.to_string(),
                    currency: wallet.currency.to_string(),
                    requested: amount.minor_units(),
                    available: wallet.available.minor_units(),
                });
            }
            wallet.available = wallet.available.checked_sub(amount)?;
            Ok(())
        })
    }

    /// Move funds from available to held (earmark for a pending commitment).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] if available is short.
    pub fn hold(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, LedgerError> {
        require_positive("hold", amount)?;
        self.mutate(owner, currency, |wallet| {
            if amount > wallet.available {
                return Err(LedgerError::InsufficientFunds {
                    owner: wallet.owner.to_string(),
                    currency: wallet.currency.to_string(),
                    requested: amount.minor_units(),
                    available: wallet.available.minor_units(),
                });
            }
            wallet.available = wallet.available.checked_sub(amount)?;
            wallet.held = wallet.held.checked_add(amount)?;
            Ok(())
        })
    }

    /// Move funds from held back to available (unwind an earmark without a
    /// transfer).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidState`] if held is short.
    pub fn release_hold(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, LedgerError> {
        require_positive("release_hold", amount)?;
        self.mutate(owner, currency, |wallet| {
            if amount > wallet.held {
                return Err(held_shortfall(wallet, "release_hold", amount));
            }
            wallet.held = wallet.held.checked_sub(amount)?;
            wallet.available = wallet.available.checked_add(amount)?;
            Ok(())
        })
    }

    /// Decrease the held balance (held funds are paid out rather than
    /// returned).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidState`] if held is short.
    pub fn debit_held(
        &self,
        owner: &ActorId,
        currency: &Currency,
        amount: Amount,
    ) -> Result<WalletBalance, LedgerError> {
        require_positive("debit_held", amount)?;
        self.mutate(owner, currency, |wallet| {
            if amount > wallet.held {
                return Err(held_shortfall(wallet, "debit_held", amount));
            }
            wallet.held = wallet.held.checked_sub(amount)?;
            Ok(())
        })
    }

    /// All wallets currently known to the store.
    pub fn wallets(&self) -> Vec<Wallet> {
        self.wallets.list()
    }

    /// Atomic check-and-mutate for one wallet, creating it on first
    /// reference. The closure runs under the store's single write lock.
    fn mutate(
        &self,
        owner: &ActorId,
        currency: &Currency,
        f: impl FnOnce(&mut Wallet) -> Result<(), LedgerError>,
    ) -> Result<WalletBalance, LedgerError> {
        let key = (owner.clone(), currency.clone());
        self.wallets.try_upsert_with(
            key,
            || Wallet::empty(owner.clone(), currency.clone()),
            |wallet| {
                f(wallet)?;
                Ok(wallet.balance())
            },
        )
    }
}

fn require_positive(operation: &str, amount: Amount) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::Validation {
            reason: format!("{operation} requires a positive amount, got {amount}"),
        });
    }
    Ok(())
}

fn held_shortfall(wallet: &Wallet, operation: &str, requested: Amount) -> LedgerError {
    LedgerError::InvalidState {
        owner: wallet.owner.to_string(),
        currency: wallet.currency.to_string(),
        operation: operation.to_string(),
        requested: requested.minor_units(),
        held: wallet.held.minor_units(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn amt(units: i64) -> Amount {
        Amount::from_minor_units(units).unwrap()
    }

    #[test]
    fn unknown_pair_reports_zero() {
        let store = WalletStore::new();
        let balance = store.balance(&owner("nobody"), &usd());
        assert_eq!(balance, WalletBalance::ZERO);
    }

    #[test]
    fn credit_creates_wallet_on_first_reference() {
        let store = WalletStore::new();
        let balance = store.credit(&owner("c1"), &usd(), amt(100_000)).unwrap();
        assert_eq!(balance.available, amt(100_000));
        assert_eq!(balance.held, Amount::ZERO);
        assert_eq!(store.wallets().len(), 1);
    }

    #[test]
    fn currencies_are_separate_wallets() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(100)).unwrap();
        store
            .credit(&owner("c1"), &Currency::new("EUR").unwrap(), amt(200))
            .unwrap();
        assert_eq!(store.balance(&owner("c1"), &usd()).available, amt(100));
        assert_eq!(
            store
                .balance(&owner("c1"), &Currency::new("EUR").unwrap())
                .available,
            amt(200)
        );
    }

    #[test]
    fn hold_moves_available_to_held() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(1_000)).unwrap();
        let balance = store.hold(&owner("c1"), &usd(), amt(400)).unwrap();
        assert_eq!(balance.available, amt(600));
        assert_eq!(balance.held, amt(400));
    }

    #[test]
    fn hold_rejects_shortfall() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(100)).unwrap();
        let err = store.hold(&owner("c1"), &usd(), amt(101)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        // No partial effect.
        let balance = store.balance(&owner("c1"), &usd());
        assert_eq!(balance.available, amt(100));
        assert_eq!(balance.held, Amount::ZERO);
    }

    #[test]
    fn hold_on_unknown_wallet_is_insufficient() {
        let store = WalletStore::new();
        let err = store.hold(&owner("ghost"), &usd(), amt(1)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available: 0, .. }
        ));
    }

    #[test]
    fn release_hold_returns_funds_to_available() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(1_000)).unwrap();
        store.hold(&owner("c1"), &usd(), amt(400)).unwrap();
        let balance = store.release_hold(&owner("c1"), &usd(), amt(400)).unwrap();
        assert_eq!(balance.available, amt(1_000));
        assert_eq!(balance.held, Amount::ZERO);
    }

    #[test]
    fn release_hold_rejects_held_shortfall() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(1_000)).unwrap();
        store.hold(&owner("c1"), &usd(), amt(100)).unwrap();
        let err = store
            .release_hold(&owner("c1"), &usd(), amt(200))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn debit_available_removes_funds() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(100_000)).unwrap();
        let balance = store
            .debit_available(&owner("c1"), &usd(), amt(50_000))
            .unwrap();
        assert_eq!(balance.available, amt(50_000));
    }

    #[test]
    fn debit_available_rejects_shortfall() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(10)).unwrap();
        let err = store
            .debit_available(&owner("c1"), &usd(), amt(11))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[test]
    fn debit_held_pays_out_earmarked_funds() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(500)).unwrap();
        store.hold(&owner("c1"), &usd(), amt(500)).unwrap();
        let balance = store.debit_held(&owner("c1"), &usd(), amt(500)).unwrap();
        assert_eq!(balance.available, Amount::ZERO);
        assert_eq!(balance.held, Amount::ZERO);
    }

    #[test]
    fn debit_held_rejects_shortfall() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(500)).unwrap();
        let err = store.debit_held(&owner("c1"), &usd(), amt(1)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidState { held: 0, .. }
        ));
    }

    #[test]
    fn zero_amounts_rejected_for_movements() {
        let store = WalletStore::new();
        assert!(store.hold(&owner("c1"), &usd(), Amount::ZERO).is_err());
        assert!(store
            .debit_available(&owner("c1"), &usd(), Amount::ZERO)
            .is_err());
        assert!(store
            .release_hold(&owner("c1"), &usd(), Amount::ZERO)
            .is_err());
        assert!(store.debit_held(&owner("c1"), &usd(), Amount::ZERO).is_err());
    }

    #[test]
    fn zero_credit_is_a_noop_that_creates_the_wallet() {
        let store = WalletStore::new();
        let balance = store.credit(&owner("c1"), &usd(), Amount::ZERO).unwrap();
        assert_eq!(balance, WalletBalance::ZERO);
        assert_eq!(store.wallets().len(), 1);
    }

    #[test]
    fn balances_never_negative_across_sequence() {
        let store = WalletStore::new();
        store.credit(&owner("c1"), &usd(), amt(300)).unwrap();
        store.hold(&owner("c1"), &usd(), amt(200)).unwrap();
        store.debit_held(&owner("c1"), &usd(), amt(150)).unwrap();
        store.release_hold(&owner("c1"), &usd(), amt(50)).unwrap();
        let balance = store.balance(&owner("c1"), &usd());
        assert_eq!(balance.available, amt(150));
        assert_eq!(balance.held, Amount::ZERO);
        assert_eq!(balance.total().unwrap(), amt(150));
    }

    #[test]
    fn clone_shares_state() {
        let store = WalletStore::new();
        let handle = store.clone();
        store.credit(&owner("c1"), &usd(), amt(42)).unwrap();
        assert_eq!(handle.balance(&owner("c1"), &usd()).available, amt(42));
    }
}
