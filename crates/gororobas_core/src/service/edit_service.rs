//! Edit use-case service.
//!
//! # Responsibility
//! - Turn a stored record into the form an editing surface starts from.
//! - Run one submission end to end: encode, diff against the canonical
//!   original, dispatch the partial update.
//!
//! # Invariants
//! - Invalid forms never reach the dispatcher.
//! - The diff base is `encode(decode(original))` whenever that validates;
//!   a non-canonical stored record does not leak spurious changes.
//! - The service owns its session; every mutation goes through it.

use crate::changeset::{diff, ChangeSet, ChangeSetError};
use crate::model::field::{EntityId, EntityKind, StorageRecord};
use crate::mutation::{dispatch_delete, dispatch_update, MutationOutcome, SessionCapability};
use crate::schema::{EntitySchema, ValidationError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for edit use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Stored record cannot be decoded into a form.
    Decode(ValidationError),
    /// Submitted form failed field validation.
    Invalid(ValidationError),
    /// Stored record belongs to another entity kind.
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
    /// Submitted form targets another entity than the stored record.
    IdentityMismatch {
        expected: EntityId,
        found: EntityId,
    },
    /// Baseline and submission could not be diffed.
    Diff(ChangeSetError),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "stored record is unreadable: {err}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::KindMismatch { expected, found } => write!(
                f,
                "expected a {} record, found {}",
                expected.as_str(),
                found.as_str()
            ),
            Self::IdentityMismatch { expected, found } => {
                write!(f, "form targets {found}, expected {expected}")
            }
            Self::Diff(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Invalid(err) => Some(err),
            Self::Diff(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    /// Fields that were sent to the store.
    pub changes: ChangeSet,
    pub outcome: MutationOutcome,
}

impl EditReport {
    /// Nothing changed; callers typically tell the user so instead of
    /// reporting a save.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty() && self.outcome.is_succeeded()
    }
}

/// Edit service facade bound to one session capability.
pub struct EditService<S: SessionCapability> {
    session: S,
}

impl<S: SessionCapability> EditService<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Decodes a stored record into its editable form.
    pub fn initial_form<E: EntitySchema>(
        &self,
        record: &StorageRecord,
    ) -> Result<E::Form, EditError> {
        ensure_kind::<E>(record)?;
        E::decode(record).map_err(EditError::Decode)
    }

    /// Validates `edited`, diffs it against `original` and dispatches the
    /// resulting partial update.
    pub fn submit<E: EntitySchema>(
        &mut self,
        original: &StorageRecord,
        edited: &E::Form,
    ) -> Result<EditReport, EditError> {
        ensure_kind::<E>(original)?;

        let encoded = match E::encode(edited) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=edit_submit module=service status=invalid kind={} id={} issues={}",
                    E::KIND.as_str(),
                    original.id,
                    err.issues().len()
                );
                return Err(EditError::Invalid(err));
            }
        };
        if encoded.id != original.id {
            return Err(EditError::IdentityMismatch {
                expected: original.id,
                found: encoded.id,
            });
        }

        // A stored record that no longer validates is diffed as stored.
        let stored_form = E::decode(original).map_err(EditError::Decode)?;
        let baseline = E::encode(&stored_form).unwrap_or_else(|_| original.clone());
        let changes = diff(&baseline, &encoded).map_err(EditError::Diff)?;
        info!(
            "event=edit_submit module=service status=start kind={} id={} fields={}",
            E::KIND.as_str(),
            original.id,
            changes.fields().collect::<Vec<_>>().join(",")
        );

        let outcome = dispatch_update(&mut self.session, original.id, &changes);
        Ok(EditReport { changes, outcome })
    }

    /// Deletes a set of entities of one kind in a single dispatch.
    pub fn delete(&mut self, kind: EntityKind, ids: &[EntityId]) -> MutationOutcome {
        dispatch_delete(&mut self.session, kind, ids)
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Gives the session back once the request is over.
    pub fn into_session(self) -> S {
        self.session
    }
}

fn ensure_kind<E: EntitySchema>(record: &StorageRecord) -> Result<(), EditError> {
    if record.kind != E::KIND {
        return Err(EditError::KindMismatch {
            expected: E::KIND,
            found: record.kind,
        });
    }
    Ok(())
}
