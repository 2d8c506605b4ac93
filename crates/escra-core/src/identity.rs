//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the custody core.
//! Each identifier is a distinct type — you cannot pass a [`ProjectId`]
//! where a [`DisputeId`] is expected.
//!
//! ## Validation
//!
//! The string-based identifier ([`ActorId`]) validates format at
//! construction time. UUID-based identifiers ([`ProjectId`], [`MilestoneId`],
//! [`DisputeId`], [`PostingId`]) are always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// String-based identifier (validated at construction)
// ---------------------------------------------------------------------------

/// An opaque identifier for an acting party: a wallet owner, project client,
/// consultant, administrator, or dispute opener.
///
/// The platform's account system issues these; the custody core treats them
/// as opaque but rejects obviously malformed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

impl TryFrom<String> for ActorId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActorId> for String {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

impl ActorId {
    /// Maximum accepted identifier length.
    pub const MAX_LEN: usize = 128;

    /// Create an actor identifier, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidActorId`] if the value is empty, longer
    /// than [`MAX_LEN`](Self::MAX_LEN), or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN || id.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidActorId(id));
        }
        Ok(Self(id))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// A unique identifier for a project (the unit that owns milestones and
    /// the parties authorized to act on them).
    ProjectId,
    "project"
);

uuid_id!(
    /// A unique identifier for a milestone — the unit of work a payment is
    /// held against.
    MilestoneId,
    "milestone"
);

uuid_id!(
    /// A unique identifier for a dispute proceeding over a funded milestone.
    DisputeId,
    "dispute"
);

uuid_id!(
    /// A unique identifier for one immutable ledger posting.
    PostingId,
    "posting"
);
