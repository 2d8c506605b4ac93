//! # Monetary Types
//!
//! Smallest-currency-unit amounts, currency codes, and split ratios.
//!
//! ## Security Invariant
//!
//! Financial amounts must never be represented as floating-point numbers.
//! [`Amount`] is an `i64` of smallest currency units (cents, paise) and all
//! arithmetic is checked integer arithmetic. The single `f64` entry point,
//! [`SplitRatio::from_ratio`], quantizes the wire-level ratio to basis
//! points *before* it can touch any monetary value, so every subsequent
//! computation is exact.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── Currency ───────────────────────────────────────────────────────────

/// An ISO 4217 currency code (e.g., "USD", "EUR").
///
/// Validated at construction: exactly 3 ASCII uppercase letters. The custody
/// core assumes a single settlement currency per transaction; it never
/// converts between currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl Currency {
    /// Create a currency code, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCurrency`] unless the code is exactly
    /// 3 ASCII uppercase letters.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::InvalidCurrency(code));
        }
        Ok(Self(code))
    }

    /// Access the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Amount ─────────────────────────────────────────────────────────────

/// A non-negative monetary amount in smallest currency units.
///
/// All wallet balances, milestone amounts, and posting amounts use this
/// type. Negative values are unrepresentable; direction is carried by the
/// debit/credit structure of a posting, never by the sign of an amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl TryFrom<i64> for Amount {
    type Error = CoreError;

    fn try_from(units: i64) -> Result<Self, Self::Error> {
        Self::from_minor_units(units)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> i64 {
        amount.0
    }
}

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from smallest currency units.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] if `units` is negative.
    pub fn from_minor_units(units: i64) -> Result<Self, CoreError> {
        if units < 0 {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be non-negative, got {units}"
            )));
        }
        Ok(Self(units))
    }

    /// The amount in smallest currency units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmountOverflow`] if the sum exceeds `i64::MAX`.
    pub fn checked_add(self, other: Amount) -> Result<Amount, CoreError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| CoreError::AmountOverflow(format!("{} + {}", self.0, other.0)))
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] if the result would be negative.
    pub fn checked_sub(self, other: Amount) -> Result<Amount, CoreError> {
        if other.0 > self.0 {
            return Err(CoreError::InvalidAmount(format!(
                "subtraction would be negative: {} - {}",
                self.0, other.0
            )));
        }
        Ok(Amount(self.0 - other.0))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Split Ratio ────────────────────────────────────────────────────────

/// The number of basis points in a whole.
const BASIS_POINTS_SCALE: u32 = 10_000;

/// The client's share of a split settlement, in basis points.
///
/// Stored as basis points (1/10,000ths) so that applying the ratio to an
/// [`Amount`] is exact integer arithmetic. A wire-level `f64` ratio is
/// quantized once, at construction; it never participates in money math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SplitRatio(u32);

impl TryFrom<u32> for SplitRatio {
    type Error = CoreError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_basis_points(bps)
    }
}

impl From<SplitRatio> for u32 {
    fn from(ratio: SplitRatio) -> u32 {
        ratio.0
    }
}

impl SplitRatio {
    /// The full share (ratio 1.0).
    pub const FULL: SplitRatio = SplitRatio(BASIS_POINTS_SCALE);

    /// The empty share (ratio 0.0).
    pub const NONE: SplitRatio = SplitRatio(0);

    /// Create a ratio from basis points.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RatioOutOfRange`] if `bps > 10_000`.
    pub fn from_basis_points(bps: u32) -> Result<Self, CoreError> {
        if bps > BASIS_POINTS_SCALE {
            return Err(CoreError::RatioOutOfRange(format!("{bps} bps")));
        }
        Ok(Self(bps))
    }

    /// Create a ratio from a fraction in `[0, 1]`, quantizing to basis
    /// points with round-half-up.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RatioOutOfRange`] if the value is not finite or
    /// lies outside `[0, 1]`.
    pub fn from_ratio(ratio: f64) -> Result<Self, CoreError> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(CoreError::RatioOutOfRange(ratio.to_string()));
        }
        // f64::round is half-away-from-zero, which equals half-up on the
        // non-negative range enforced above.
        let bps = (ratio * f64::from(BASIS_POINTS_SCALE)).round() as u32;
        Self::from_basis_points(bps)
    }

    /// The ratio in basis points.
    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Apply the ratio to an amount, rounding half-up at the smallest
    /// currency unit.
    ///
    /// The computation is `(amount · bps + 5000) / 10000` in 128-bit integer
    /// arithmetic, so it cannot overflow or lose precision for any
    /// representable [`Amount`].
    pub fn apply(&self, amount: Amount) -> Amount {
        let scaled = i128::from(amount.minor_units()) * i128::from(self.0);
        let half = i128::from(BASIS_POINTS_SCALE / 2);
        let units = (scaled + half) / i128::from(BASIS_POINTS_SCALE);
        // amount is non-negative and bps <= 10000, so the quotient fits i64.
        Amount(units as i64)
    }
}

impl std::fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bp", self.0)
    }
}
