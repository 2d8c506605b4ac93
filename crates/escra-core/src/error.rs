//! # Core Error Types
//!
//! Validation errors for domain primitives. Every variant carries the
//! rejected input so callers can report what was wrong without re-deriving
//! it from logs.

use thiserror::Error;

/// Errors arising from domain-primitive construction and arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Actor identifier failed validation (empty, too long, or whitespace).
    #[error("invalid actor id: \"{0}\"")]
    InvalidActorId(String),

    /// Currency code is not a 3-letter uppercase ASCII code.
    #[error("invalid currency code: \"{0}\"")]
    InvalidCurrency(String),

    /// Monetary amount is invalid for the operation (e.g., negative where a
    /// positive amount is required).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Monetary arithmetic overflowed the smallest-unit representation.
    #[error("amount arithmetic overflow: {0}")]
    AmountOverflow(String),

    /// Split ratio is outside the closed interval [0, 1].
    #[error("split ratio out of range [0, 1]: {0}")]
    RatioOutOfRange(String),

    /// Timestamp string is not in the canonical `%Y-%m-%dT%H:%M:%SZ` form.
    #[error("invalid timestamp: \"{0}\"")]
    InvalidTimestamp(String),
}
