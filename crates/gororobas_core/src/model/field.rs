//! Field values and storage records.
//!
//! # Responsibility
//! - Enumerate every field value shape at compile time.
//! - Carry the canonical persisted shape of one entity (`StorageRecord`).
//!
//! # Invariants
//! - A canonical record holds every declared field of its kind; absent
//!   optional values are `FieldValue::Null`.
//! - Optional rich text is stored as `Null`, never as a blank document.

use crate::model::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

static NULL_VALUE: FieldValue = FieldValue::Null;

/// Stable identifier of one entity.
pub type EntityId = Uuid;

/// Editable entity families handled by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Note,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Note => "note",
        }
    }

    /// Storage table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Note => "notes",
        }
    }
}

/// Stored image: opaque identifier plus optional inline metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: None,
            height: None,
            alt: None,
        }
    }
}

/// One field value in storage shape.
///
/// Equality is structural: documents compare as trees, images compare id
/// and metadata, references compare identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Enum(String),
    EnumList(Vec<String>),
    RichText(Document),
    Image(ImageRef),
    Reference(EntityId),
}

impl FieldValue {
    /// Short shape name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Enum(_) => "enum",
            Self::EnumList(_) => "enum list",
            Self::RichText(_) => "rich text",
            Self::Image(_) => "image",
            Self::Reference(_) => "reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Canonical persisted shape of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub kind: EntityKind,
    pub id: EntityId,
    pub fields: BTreeMap<String, FieldValue>,
}

impl StorageRecord {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            kind,
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field value with absence read as `Null`.
    pub fn value_or_null(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&NULL_VALUE)
    }
}
