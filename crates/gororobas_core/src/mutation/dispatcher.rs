//! Single-attempt mutation dispatch.
//!
//! Per call: `Idle -> Authorizing -> Authorized -> Applying -> Succeeded |
//! Failed`, or `Authorizing -> Unauthorized -> Rejected`. An empty
//! change-set (or id set) goes `Authorized -> Succeeded` without touching
//! the store.

use super::{MutationOutcome, SessionCapability, StoreClient, StoreError};
use crate::changeset::ChangeSet;
use crate::model::field::{EntityId, EntityKind};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// Dispatch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Authorizing,
    Authorized,
    Unauthorized,
    Applying,
    Succeeded,
    Failed,
    Rejected,
}

impl DispatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authorizing => "authorizing",
            Self::Authorized => "authorized",
            Self::Unauthorized => "unauthorized",
            Self::Applying => "applying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether `next` is a legal transition from this state.
    pub fn can_advance_to(self, next: DispatchState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Authorizing)
                | (Self::Authorizing, Self::Authorized)
                | (Self::Authorizing, Self::Unauthorized)
                | (Self::Unauthorized, Self::Rejected)
                | (Self::Authorized, Self::Applying)
                | (Self::Authorized, Self::Succeeded)
                | (Self::Applying, Self::Succeeded)
                | (Self::Applying, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Rejected)
    }
}

struct Attempt {
    operation: &'static str,
    kind: EntityKind,
    state: DispatchState,
    started_at: Instant,
}

impl Attempt {
    fn start(operation: &'static str, kind: EntityKind) -> Self {
        Self {
            operation,
            kind,
            state: DispatchState::Idle,
            started_at: Instant::now(),
        }
    }

    fn advance(&mut self, next: DispatchState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal dispatch transition {} -> {}",
            self.state.as_str(),
            next.as_str()
        );
        debug!(
            "event=mutation_transition module=mutation op={} kind={} from={} to={}",
            self.operation,
            self.kind.as_str(),
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }

    /// Runs the authorization gate; `Err` carries the `Rejected` outcome.
    fn authorize<S: SessionCapability>(&mut self, session: &S) -> Result<(), MutationOutcome> {
        self.advance(DispatchState::Authorizing);
        match session.authorize() {
            Ok(()) => {
                self.advance(DispatchState::Authorized);
                Ok(())
            }
            Err(err) => {
                self.advance(DispatchState::Unauthorized);
                self.advance(DispatchState::Rejected);
                warn!(
                    "event=mutation_dispatch module=mutation status=rejected op={} kind={} reason={}",
                    self.operation,
                    self.kind.as_str(),
                    err
                );
                Err(MutationOutcome::Rejected(err))
            }
        }
    }

    fn finish_noop(mut self) -> MutationOutcome {
        self.advance(DispatchState::Succeeded);
        info!(
            "event=mutation_dispatch module=mutation status=noop op={} kind={}",
            self.operation,
            self.kind.as_str()
        );
        MutationOutcome::Succeeded
    }

    fn finish<T>(
        mut self,
        result: Result<T, StoreError>,
        affected: impl Fn(&T) -> usize,
    ) -> MutationOutcome {
        match result {
            Ok(value) => {
                self.advance(DispatchState::Succeeded);
                info!(
                    "event=mutation_dispatch module=mutation status=ok op={} kind={} affected={} duration_ms={}",
                    self.operation,
                    self.kind.as_str(),
                    affected(&value),
                    self.started_at.elapsed().as_millis()
                );
                MutationOutcome::Succeeded
            }
            Err(err) => {
                self.advance(DispatchState::Failed);
                error!(
                    "event=mutation_dispatch module=mutation status=error op={} kind={} duration_ms={} error={}",
                    self.operation,
                    self.kind.as_str(),
                    self.started_at.elapsed().as_millis(),
                    err
                );
                MutationOutcome::Failed(err)
            }
        }
    }
}

/// Applies `changes` to entity `id` under `session`.
///
/// Rejected sessions never reach the store; an empty change-set succeeds
/// without a store call; otherwise exactly one store call is made.
pub fn dispatch_update<S: SessionCapability>(
    session: &mut S,
    id: EntityId,
    changes: &ChangeSet,
) -> MutationOutcome {
    let mut attempt = Attempt::start("update", changes.kind());
    if let Err(outcome) = attempt.authorize(session) {
        return outcome;
    }
    if changes.is_empty() {
        return attempt.finish_noop();
    }

    attempt.advance(DispatchState::Applying);
    let result = session.client().update_fields(id, changes);
    let fields = changes.len();
    attempt.finish(result, |_| fields)
}

/// Deletes every entity in `ids` under `session`, in one store call.
///
/// Duplicate ids are collapsed; an empty set succeeds without a store call.
pub fn dispatch_delete<S: SessionCapability>(
    session: &mut S,
    kind: EntityKind,
    ids: &[EntityId],
) -> MutationOutcome {
    let mut attempt = Attempt::start("delete", kind);
    if let Err(outcome) = attempt.authorize(session) {
        return outcome;
    }

    let unique: Vec<EntityId> = ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        return attempt.finish_noop();
    }

    attempt.advance(DispatchState::Applying);
    let result = session.client().delete_entities(kind, &unique);
    attempt.finish(result, |deleted| *deleted)
}
