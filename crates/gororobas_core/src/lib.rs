//! Core editing pipeline for Gororobas profiles and notes.
//! This crate is the single source of truth for document shape, field
//! validation, change detection and mutation authorization.

pub mod changeset;
pub mod db;
pub mod logging;
pub mod model;
pub mod mutation;
pub mod repo;
pub mod schema;
pub mod service;

pub use changeset::{diff, ChangeSet, ChangeSetError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{truncate, Document, Mark, Node, NodeId, NodeKind, ShapeError};
pub use model::field::{EntityId, EntityKind, FieldValue, ImageRef, StorageRecord};
pub use mutation::{
    dispatch_delete, dispatch_update, AuthorizationError, BoundSession, DispatchState,
    MutationOutcome, SessionCapability, StoreClient, StoreError,
};
pub use repo::entity_repo::{EntityRepository, RepoError, RepoResult, SqliteEntityStore};
pub use schema::note::{NoteForm, NoteSchema};
pub use schema::profile::{ProfileForm, ProfileSchema};
pub use schema::{EntitySchema, FieldIssue, ValidationError};
pub use service::edit_service::{EditError, EditReport, EditService};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
