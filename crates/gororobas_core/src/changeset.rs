//! Change-set engine.
//!
//! # Responsibility
//! - Compute the minimal field-level difference between two storage records.
//! - Carry that difference to the mutation dispatcher as a partial update.
//!
//! # Invariants
//! - Keys are always declared fields of the change-set's entity kind.
//! - A missing key means "unchanged"; clearing is an explicit `Null` value.
//! - Only records of the same kind and id are diffed.
//! - Equality is syntactic: documents compare as trees, so a reordered mark
//!   list is a change even when the plain text is identical.

use crate::model::field::{EntityId, EntityKind, FieldValue, StorageRecord};
use crate::schema::{declared_fields, field_spec};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field name -> new value, restricted to fields that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    kind: EntityKind,
    changes: BTreeMap<&'static str, FieldValue>,
}

/// Rejected change-set construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetError {
    UndeclaredField {
        kind: EntityKind,
        field: String,
    },
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// `diff` was handed records of different entity kinds.
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
    /// `diff` was handed two different entities of the same kind.
    IdentityMismatch {
        expected: EntityId,
        found: EntityId,
    },
}

impl Display for ChangeSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndeclaredField { kind, field } => {
                write!(f, "`{field}` is not a declared {} field", kind.as_str())
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "`{field}` expects {expected}, found {found}"),
            Self::KindMismatch { expected, found } => write!(
                f,
                "cannot diff a {} record against a {} record",
                expected.as_str(),
                found.as_str()
            ),
            Self::IdentityMismatch { expected, found } => {
                write!(f, "cannot diff entity {expected} against entity {found}")
            }
        }
    }
}

impl Error for ChangeSetError {}

impl ChangeSet {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            changes: BTreeMap::new(),
        }
    }

    /// Builds a change-set from explicit pairs, checking names and shapes
    /// against the declared fields of `kind`.
    pub fn for_fields<I, K>(kind: EntityKind, pairs: I) -> Result<Self, ChangeSetError>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        let mut changes = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            let spec = field_spec(kind, name).ok_or_else(|| ChangeSetError::UndeclaredField {
                kind,
                field: name.to_string(),
            })?;
            if !spec.kind.admits(&value) {
                return Err(ChangeSetError::TypeMismatch {
                    field: spec.name,
                    expected: spec.kind.expected(),
                    found: value.type_name(),
                });
            }
            changes.insert(spec.name, value);
        }
        Ok(Self { kind, changes })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.changes.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    /// Changed field names in declaration-independent, sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.changes.iter().map(|(name, value)| (*name, value))
    }

    /// Applies this change-set as a partial update: listed fields are
    /// overwritten, every other field is left untouched.
    pub fn apply_to(&self, record: &mut StorageRecord) {
        for (name, value) in &self.changes {
            record.set(*name, value.clone());
        }
    }
}

/// Diffs two versions of the same entity field by field.
///
/// Only fields declared for `original.kind` are compared; absent fields
/// read as `Null` on both sides.
pub fn diff(
    original: &StorageRecord,
    edited: &StorageRecord,
) -> Result<ChangeSet, ChangeSetError> {
    if edited.kind != original.kind {
        return Err(ChangeSetError::KindMismatch {
            expected: original.kind,
            found: edited.kind,
        });
    }
    if edited.id != original.id {
        return Err(ChangeSetError::IdentityMismatch {
            expected: original.id,
            found: edited.id,
        });
    }

    let kind = original.kind;
    let changes = declared_fields(kind)
        .iter()
        .filter_map(|spec| {
            let before = original.value_or_null(spec.name);
            let after = edited.value_or_null(spec.name);
            (before != after).then(|| (spec.name, after.clone()))
        })
        .collect();
    Ok(ChangeSet { kind, changes })
}
