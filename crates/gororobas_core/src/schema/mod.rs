//! Schema transformer between storage and form shapes.
//!
//! # Responsibility
//! - Declare the fields of every entity kind (`FieldSpec`).
//! - Provide the `EntitySchema` contract: `decode` (storage -> form) and
//!   `encode` (form -> storage), both pure.
//! - Aggregate every field problem of one pass into a `ValidationError`.
//!
//! # Invariants
//! - `encode(decode(s)) == s` for every canonical storage record `s`.
//! - `decode` defaults missing fields and only fails on type-mismatched
//!   required fields.
//! - `encode` never stops at the first failure.

pub mod image;
pub mod note;
pub mod profile;
pub mod rich_text;

use crate::model::document::Document;
use crate::model::field::{EntityId, EntityKind, FieldValue, ImageRef, StorageRecord};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const HANDLE_MIN_CHARS: usize = 3;
pub const HANDLE_MAX_CHARS: usize = 60;

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid handle regex"));

/// Storage-level shape of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Single value from a fixed, case-sensitive set.
    Enum(&'static [&'static str]),
    /// Any number of values from a fixed, case-sensitive set.
    EnumList(&'static [&'static str]),
    RichText,
    Image,
    Reference(EntityKind),
}

impl FieldKind {
    /// Whether `value` has this storage shape. `Null` is admitted by every
    /// kind; presence is a separate rule.
    pub fn admits(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (_, FieldValue::Null)
                | (Self::Text, FieldValue::Text(_))
                | (Self::Integer, FieldValue::Integer(_))
                | (Self::Enum(_), FieldValue::Enum(_))
                | (Self::EnumList(_), FieldValue::EnumList(_))
                | (Self::RichText, FieldValue::RichText(_))
                | (Self::Image, FieldValue::Image(_))
                | (Self::Reference(_), FieldValue::Reference(_))
        )
    }

    pub fn expected(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Enum(_) => "enum",
            Self::EnumList(_) => "enum list",
            Self::RichText => "rich text",
            Self::Image => "image",
            Self::Reference(_) => "reference",
        }
    }
}

/// One declared field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Declared fields of `kind`, in storage column order.
pub fn declared_fields(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Profile => profile::PROFILE_FIELDS,
        EntityKind::Note => note::NOTE_FIELDS,
    }
}

/// Looks up one declared field by name.
pub fn field_spec(kind: EntityKind, name: &str) -> Option<&'static FieldSpec> {
    declared_fields(kind).iter().find(|spec| spec.name == name)
}

/// One field-level problem: path plus human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Every field problem found in one decode/encode pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.issues.push(FieldIssue::new(path, reason));
    }

    pub fn extend(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when any issue targets `field` or a path below it.
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| {
            issue.path == field
                || issue
                    .path
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('['))
        })
    }
}

impl From<FieldIssue> for ValidationError {
    fn from(value: FieldIssue) -> Self {
        Self {
            issues: vec![value],
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fields: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Bidirectional, validating transform for one entity kind.
pub trait EntitySchema {
    /// User-editable shape.
    type Form;

    const KIND: EntityKind;

    fn fields() -> &'static [FieldSpec] {
        declared_fields(Self::KIND)
    }

    /// Storage -> form. Missing fields take field defaults.
    fn decode(record: &StorageRecord) -> Result<Self::Form, ValidationError>;

    /// Form -> storage, validating every field.
    fn encode(form: &Self::Form) -> Result<StorageRecord, ValidationError>;
}

/// Typed, lenient reads from a storage record.
pub(crate) struct FieldReader<'r> {
    record: &'r StorageRecord,
    issues: ValidationError,
}

impl<'r> FieldReader<'r> {
    pub(crate) fn new(kind: EntityKind, record: &'r StorageRecord) -> Self {
        let mut issues = ValidationError::new();
        if record.kind != kind {
            issues.push(
                "kind",
                format!(
                    "expected a {} record, found {}",
                    kind.as_str(),
                    record.kind.as_str()
                ),
            );
        }
        Self { record, issues }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.record.id
    }

    /// Present, non-null value of the declared shape; `None` means "use the
    /// field default".
    fn value(&mut self, spec: &FieldSpec) -> Option<&'r FieldValue> {
        let value = self.record.get(spec.name)?;
        if value.is_null() {
            return None;
        }
        if spec.kind.admits(value) {
            return Some(value);
        }

        if spec.required {
            self.issues.push(
                spec.name,
                format!("expected {}, found {}", spec.kind.expected(), value.type_name()),
            );
        } else {
            warn!(
                "event=schema_decode module=schema status=defaulted kind={} field={} found={}",
                self.record.kind.as_str(),
                spec.name,
                value.type_name()
            );
        }
        None
    }

    pub(crate) fn text(&mut self, spec: &FieldSpec) -> Option<String> {
        match self.value(spec) {
            Some(FieldValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) fn integer(&mut self, spec: &FieldSpec) -> Option<i64> {
        match self.value(spec) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub(crate) fn enum_value(&mut self, spec: &FieldSpec) -> Option<String> {
        match self.value(spec) {
            Some(FieldValue::Enum(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) fn enum_list(&mut self, spec: &FieldSpec) -> Vec<String> {
        match self.value(spec) {
            Some(FieldValue::EnumList(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn rich_text(&mut self, spec: &FieldSpec) -> Option<&'r Document> {
        match self.value(spec) {
            Some(FieldValue::RichText(document)) => Some(document),
            _ => None,
        }
    }

    pub(crate) fn image(&mut self, spec: &FieldSpec) -> Option<&'r ImageRef> {
        match self.value(spec) {
            Some(FieldValue::Image(image)) => Some(image),
            _ => None,
        }
    }

    pub(crate) fn reference(&mut self, spec: &FieldSpec) -> Option<EntityId> {
        match self.value(spec) {
            Some(FieldValue::Reference(id)) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn finish<T>(self, form: T) -> Result<T, ValidationError> {
        if self.issues.is_empty() {
            Ok(form)
        } else {
            Err(self.issues)
        }
    }
}

/// Collects encoded fields and their issues into one record.
pub(crate) struct RecordWriter {
    record: StorageRecord,
    issues: ValidationError,
}

impl RecordWriter {
    pub(crate) fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            record: StorageRecord::new(kind, id),
            issues: ValidationError::new(),
        }
    }

    pub(crate) fn set(&mut self, spec: &FieldSpec, value: FieldValue) {
        self.record.set(spec.name, value);
    }

    pub(crate) fn put<E: Into<ValidationError>>(
        &mut self,
        spec: &FieldSpec,
        value: Result<FieldValue, E>,
    ) {
        match value {
            Ok(value) => self.record.set(spec.name, value),
            Err(err) => self.issues.extend(err.into()),
        }
    }

    /// Adds a presence issue for every required field left `Null` and
    /// returns the record when no issue was collected.
    pub(crate) fn finish(mut self, fields: &[FieldSpec]) -> Result<StorageRecord, ValidationError> {
        for spec in fields {
            if spec.required
                && self.record.value_or_null(spec.name).is_null()
                && !self.issues.mentions(spec.name)
            {
                self.issues.push(spec.name, "is required");
            }
        }
        if self.issues.is_empty() {
            Ok(self.record)
        } else {
            Err(self.issues)
        }
    }
}

pub(crate) fn encode_required_text(spec: &FieldSpec, value: &str) -> Result<FieldValue, FieldIssue> {
    if value.trim().is_empty() {
        return Err(FieldIssue::new(spec.name, "must not be blank"));
    }
    Ok(FieldValue::Text(value.to_string()))
}

/// Form uses `""` for an absent optional text.
pub(crate) fn encode_optional_text(value: &str) -> FieldValue {
    if value.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(value.to_string())
    }
}

pub(crate) fn encode_handle(spec: &FieldSpec, value: &str) -> Result<FieldValue, FieldIssue> {
    check_handle(value).map_err(|reason| FieldIssue::new(spec.name, reason))?;
    Ok(FieldValue::Text(value.to_string()))
}

/// Checks a public URL handle: lowercase ASCII letters, digits and `-`.
pub fn check_handle(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length < HANDLE_MIN_CHARS || length > HANDLE_MAX_CHARS {
        return Err(format!(
            "must have between {HANDLE_MIN_CHARS} and {HANDLE_MAX_CHARS} characters"
        ));
    }
    if !HANDLE_RE.is_match(value) {
        return Err("may only contain lowercase letters, digits and `-`".to_string());
    }
    Ok(())
}

pub(crate) fn check_enum(
    path: impl Into<String>,
    value: &str,
    allowed: &[&str],
) -> Result<(), FieldIssue> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(FieldIssue::new(
        path,
        format!("`{value}` is not one of: {}", allowed.join(", ")),
    ))
}

pub(crate) fn encode_enum(
    spec: &FieldSpec,
    value: &str,
    allowed: &[&str],
) -> Result<FieldValue, FieldIssue> {
    check_enum(spec.name, value, allowed)?;
    Ok(FieldValue::Enum(value.to_string()))
}

/// Checks every entry; duplicates are rejected as well.
pub(crate) fn encode_enum_list(
    spec: &FieldSpec,
    values: &[String],
    allowed: &[&str],
) -> Result<FieldValue, ValidationError> {
    let mut issues = ValidationError::new();
    for (index, value) in values.iter().enumerate() {
        let path = format!("{}[{index}]", spec.name);
        if let Err(issue) = check_enum(path.as_str(), value, allowed) {
            issues.extend(issue.into());
        } else if values[..index].contains(value) {
            issues.push(path, format!("`{value}` is listed more than once"));
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(FieldValue::EnumList(values.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::{check_handle, declared_fields, field_spec, FieldKind, FieldSpec, ValidationError};
    use crate::model::field::{EntityKind, FieldValue};

    #[test]
    fn handle_rules() {
        assert!(check_handle("maria-da-horta").is_ok());
        assert!(check_handle("ab").is_err());
        assert!(check_handle("Maria").is_err());
        assert!(check_handle("maria horta").is_err());
    }

    #[test]
    fn null_is_admitted_by_every_kind() {
        for spec in declared_fields(EntityKind::Note) {
            assert!(spec.kind.admits(&FieldValue::Null), "{}", spec.name);
        }
        assert!(!FieldKind::Text.admits(&FieldValue::Integer(1)));
    }

    #[test]
    fn field_lookup_is_by_exact_name() {
        assert!(field_spec(EntityKind::Profile, "bio").is_some());
        assert!(field_spec(EntityKind::Profile, "Bio").is_none());
        assert!(field_spec(EntityKind::Profile, "id").is_none());
    }

    #[test]
    fn mentions_matches_nested_paths_only_on_boundaries() {
        let mut err = ValidationError::new();
        err.push("types[1]", "bad");
        err.push("bio/doc/0", "bad");
        assert!(err.mentions("types"));
        assert!(err.mentions("bio"));
        assert!(!err.mentions("bi"));
        let spec = FieldSpec::required("handle", FieldKind::Text);
        assert!(!err.mentions(spec.name));
    }
}
