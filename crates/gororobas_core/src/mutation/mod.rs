//! Mutation dispatch contracts.
//!
//! # Responsibility
//! - Define the store and session capabilities a mutation is bound to.
//! - Run one update/delete attempt through the authorization gate.
//!
//! # Invariants
//! - No store access happens before the session is authorized.
//! - At most one store call per dispatch; no retries in this layer.
//! - The session is always passed explicitly; there is no ambient lookup.

mod dispatcher;
mod session;

pub use dispatcher::{dispatch_delete, dispatch_update, DispatchState};
pub use session::BoundSession;

use crate::changeset::ChangeSet;
use crate::model::field::{EntityId, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque failure reported by the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    reason: String,
}

impl StoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Internal detail for logs; not meant for end users.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "store failure: {}", self.reason)
    }
}

impl Error for StoreError {}

/// Session is not allowed to mutate anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    NotSignedIn,
    Expired { expires_at_ms: i64 },
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "session is not signed in"),
            Self::Expired { expires_at_ms } => write!(f, "session expired at {expires_at_ms}"),
        }
    }
}

impl Error for AuthorizationError {}

/// Request-scoped client able to apply partial updates and deletions.
pub trait StoreClient {
    /// Overwrites exactly the fields listed in `changes`.
    fn update_fields(&mut self, id: EntityId, changes: &ChangeSet) -> Result<(), StoreError>;

    /// Deletes every listed entity and returns how many rows went away.
    fn delete_entities(&mut self, kind: EntityKind, ids: &[EntityId]) -> Result<usize, StoreError>;
}

/// Authenticated capability handed in by the authentication collaborator.
///
/// The client is owned by the session, so it is bound to it one to one.
pub trait SessionCapability {
    type Client: StoreClient;

    /// Whether this session may mutate for the current request.
    fn authorize(&self) -> Result<(), AuthorizationError>;

    /// Store client bound to this session.
    fn client(&mut self) -> &mut Self::Client;
}

/// Final result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Succeeded,
    Failed(StoreError),
    Rejected(AuthorizationError),
}

impl MutationOutcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Terminal state reached by the dispatch.
    pub fn state(&self) -> DispatchState {
        match self {
            Self::Succeeded => DispatchState::Succeeded,
            Self::Failed(_) => DispatchState::Failed,
            Self::Rejected(_) => DispatchState::Rejected,
        }
    }

    /// Generic, user-facing message. Never includes store details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Succeeded => "saved",
            Self::Failed(_) => "something went wrong, please try again",
            Self::Rejected(_) => "not permitted",
        }
    }
}
