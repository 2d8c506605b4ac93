//! # API Error Types
//!
//! Maps domain errors from the escrow engine to machine-readable error
//! codes and structured JSON error bodies. The mapping from codes to HTTP
//! statuses lives here too, so every transport layer agrees on it; the
//! transport itself is out of scope for this crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use escra_escrow::{ErrorKind, EscrowError};

/// Machine-readable error code, one per domain error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input: bad amount, currency, ratio, or posting.
    ValidationError,
    /// Wallet available balance too low for the requested debit.
    InsufficientFunds,
    /// Operation not legal for the current milestone or dispute status.
    InvalidStateTransition,
    /// Unknown milestone, dispute, or project reference.
    NotFound,
    /// Caller lacks the role the operation requires.
    Unauthorized,
    /// Lock contention; the caller may retry.
    ConcurrentModification,
}

impl ErrorCode {
    /// The canonical string form of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
        }
    }

    /// The HTTP status a transport layer should answer with.
    ///
    /// State-machine rejections and lock contention are conflicts (409);
    /// insufficient funds is a semantic rejection of a well-formed
    /// request (422).
    pub fn suggested_http_status(&self) -> u16 {
        match self {
            Self::ValidationError | Self::InsufficientFunds => 422,
            Self::InvalidStateTransition | Self::ConcurrentModification => 409,
            Self::NotFound => 404,
            Self::Unauthorized => 403,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => Self::ValidationError,
            ErrorKind::InsufficientFunds => Self::InsufficientFunds,
            ErrorKind::InvalidStateTransition => Self::InvalidStateTransition,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::ConcurrentModification => Self::ConcurrentModification,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command-surface error: a code plus a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// The machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable error message, safe to return to clients.
    pub message: String,
}

impl ApiError {
    /// Build a validation error from a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationError,
            message: message.into(),
        }
    }

    /// The structured body a transport layer serializes for this error.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message.clone(),
            },
        }
    }
}

impl From<EscrowError> for ApiError {
    fn from(err: EscrowError) -> Self {
        Self {
            code: err.kind().into(),
            message: err.to_string(),
        }
    }
}

/// Structured JSON error response body.
///
/// All error responses use this shape for consistency across the command
/// surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The wrapped error detail.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND").
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}
