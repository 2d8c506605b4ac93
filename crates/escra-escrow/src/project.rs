//! # Project Records and Authorization
//!
//! A project binds the client, the assigned consultant, and the set of
//! administrators authorized to adjudicate disputes. The predicates here
//! are the authorization surface the transport layer consults; the escrow
//! controller enforces them again before moving funds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use escra_core::{ActorId, ProjectId, Timestamp};
use escra_ledger::Store;

use crate::error::EscrowError;

/// Who is authorizing a milestone release.
///
/// A release is triggered either by a project administrator or by the
/// agreed auto-release mechanism (e.g., an approval-window expiry the
/// platform scheduler fires). Modeling the trigger as a closed type keeps
/// magic actor ids out of the authorization path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseAuthority {
    /// A named administrator of the project.
    Admin {
        /// The administrator's identifier.
        actor: ActorId,
    },
    /// The platform's agreed auto-release trigger.
    AutoRelease,
}

/// A project: the unit that owns milestones and the parties authorized to
/// act on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// The paying client.
    pub client: ActorId,
    /// The assigned consultant (payee).
    pub consultant: ActorId,
    /// Administrators authorized to adjudicate disputes and approve
    /// releases/refunds.
    pub admins: BTreeSet<ActorId>,
    /// When the project was created (UTC).
    pub created_at: Timestamp,
}

impl Project {
    /// Create a project record.
    pub fn new(
        client: ActorId,
        consultant: ActorId,
        admins: impl IntoIterator<Item = ActorId>,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            client,
            consultant,
            admins: admins.into_iter().collect(),
            created_at: Timestamp::now(),
        }
    }

    /// Whether `actor` is the paying client.
    pub fn is_client(&self, actor: &ActorId) -> bool {
        &self.client == actor
    }

    /// Whether `actor` is the assigned consultant.
    pub fn is_consultant(&self, actor: &ActorId) -> bool {
        &self.consultant == actor
    }

    /// Whether `actor` is a project administrator.
    pub fn is_admin(&self, actor: &ActorId) -> bool {
        self.admins.contains(actor)
    }

    /// Whether `actor` may adjudicate disputes on this project.
    pub fn may_adjudicate(&self, actor: &ActorId) -> bool {
        self.is_admin(actor)
    }

    /// Whether `actor` may open a dispute: any project participant.
    pub fn is_participant(&self, actor: &ActorId) -> bool {
        self.is_client(actor) || self.is_consultant(actor) || self.is_admin(actor)
    }

    /// Whether the given authority may trigger a release or refund.
    pub fn may_release(&self, authority: &ReleaseAuthority) -> bool {
        match authority {
            ReleaseAuthority::Admin { actor } => self.is_admin(actor),
            ReleaseAuthority::AutoRelease => true,
        }
    }
}

/// Store of project records.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: Store<ProjectId, Project>,
}

impl ProjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            projects: Store::new(),
        }
    }

    /// Register a project.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Validation`] if a project with the same id
    /// already exists.
    pub fn insert(&self, project: Project) -> Result<(), EscrowError> {
        if self.projects.contains(&project.id) {
            return Err(EscrowError::Validation {
                reason: format!("project {} already exists", project.id),
            });
        }
        self.projects.insert(project.id, project);
        Ok(())
    }

    /// Retrieve a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::ProjectNotFound`] for unknown ids.
    pub fn get(&self, id: &ProjectId) -> Result<Project, EscrowError> {
        self.projects
            .get(id)
            .ok_or(EscrowError::ProjectNotFound(*id))
    }
}
