//! Note schema.
//!
//! Notes have a required rich-text title, an optional body, a public handle,
//! a set of note types and an optional author reference that the form
//! carries through unchanged.

use crate::model::document::Document;
use crate::model::field::{EntityId, EntityKind, FieldValue, StorageRecord};
use crate::schema::rich_text::{decode_rich_text, encode_rich_text};
use crate::schema::{
    encode_enum, encode_enum_list, encode_handle, EntitySchema, FieldIssue, FieldKind,
    FieldReader, FieldSpec, RecordWriter, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Allowed note types, matched case-sensitively.
pub const NOTE_TYPES: &[&str] = &[
    "EXPERIMENTO",
    "ENSINAMENTO",
    "DESCOBERTA",
    "PERGUNTA",
    "INSPIRACAO",
    "RECEITA",
    "CONQUISTA",
];

/// Allowed note visibility values.
pub const NOTE_VISIBILITIES: &[&str] = &["PUBLIC", "COMMUNITY", "PRIVATE"];

/// Visibility used when storage has none.
pub const DEFAULT_VISIBILITY: &str = "PRIVATE";

/// Grapheme budget of the note card title preview.
pub const NOTE_TITLE_PREVIEW_CHARS: usize = 60;

const TITLE: FieldSpec = FieldSpec::required("title", FieldKind::RichText);
const BODY: FieldSpec = FieldSpec::optional("body", FieldKind::RichText);
const HANDLE: FieldSpec = FieldSpec::required("handle", FieldKind::Text);
// Always present in storage; the list itself may be empty.
const TYPES: FieldSpec = FieldSpec::required("types", FieldKind::EnumList(NOTE_TYPES));
const VISIBILITY: FieldSpec =
    FieldSpec::required("visibility", FieldKind::Enum(NOTE_VISIBILITIES));
const PUBLISHED_AT: FieldSpec = FieldSpec::optional("published_at", FieldKind::Integer);
const CREATED_BY: FieldSpec =
    FieldSpec::optional("created_by", FieldKind::Reference(EntityKind::Profile));

/// Declared note fields.
pub const NOTE_FIELDS: &[FieldSpec] = &[
    TITLE,
    BODY,
    HANDLE,
    TYPES,
    VISIBILITY,
    PUBLISHED_AT,
    CREATED_BY,
];

/// Editable note shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteForm {
    pub id: EntityId,
    pub title: Document,
    pub body: Document,
    pub handle: String,
    pub types: Vec<String>,
    pub visibility: String,
    /// Unix epoch milliseconds.
    pub published_at: Option<i64>,
    /// Author profile; not editable, carried through.
    pub created_by: Option<EntityId>,
}

impl NoteForm {
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            title: Document::empty(),
            body: Document::empty(),
            handle: String::new(),
            types: Vec::new(),
            visibility: DEFAULT_VISIBILITY.to_string(),
            published_at: None,
            created_by: None,
        }
    }

    /// Card preview of the title.
    pub fn title_preview(&self) -> String {
        self.title.preview(NOTE_TITLE_PREVIEW_CHARS)
    }
}

pub struct NoteSchema;

impl EntitySchema for NoteSchema {
    type Form = NoteForm;

    const KIND: EntityKind = EntityKind::Note;

    fn decode(record: &StorageRecord) -> Result<NoteForm, ValidationError> {
        let mut reader = FieldReader::new(Self::KIND, record);
        let form = NoteForm {
            id: reader.id(),
            title: decode_rich_text(reader.rich_text(&TITLE)),
            body: decode_rich_text(reader.rich_text(&BODY)),
            handle: reader.text(&HANDLE).unwrap_or_default(),
            types: reader.enum_list(&TYPES),
            visibility: reader
                .enum_value(&VISIBILITY)
                .unwrap_or_else(|| DEFAULT_VISIBILITY.to_string()),
            published_at: reader.integer(&PUBLISHED_AT),
            created_by: reader.reference(&CREATED_BY),
        };
        reader.finish(form)
    }

    fn encode(form: &NoteForm) -> Result<StorageRecord, ValidationError> {
        let mut writer = RecordWriter::new(Self::KIND, form.id);
        writer.put(&TITLE, encode_rich_text(&TITLE, &form.title));
        writer.put(&BODY, encode_rich_text(&BODY, &form.body));
        writer.put(&HANDLE, encode_handle(&HANDLE, &form.handle));
        writer.put(&TYPES, encode_enum_list(&TYPES, &form.types, NOTE_TYPES));
        writer.put(
            &VISIBILITY,
            encode_enum(&VISIBILITY, &form.visibility, NOTE_VISIBILITIES),
        );
        writer.put(&PUBLISHED_AT, encode_published_at(form.published_at));
        writer.put(&CREATED_BY, encode_created_by(form.created_by));
        writer.finish(NOTE_FIELDS)
    }
}

fn encode_published_at(value: Option<i64>) -> Result<FieldValue, FieldIssue> {
    match value {
        None => Ok(FieldValue::Null),
        Some(millis) if millis < 0 => Err(FieldIssue::new(
            PUBLISHED_AT.name,
            "must not be before 1970-01-01",
        )),
        Some(millis) => Ok(FieldValue::Integer(millis)),
    }
}

fn encode_created_by(value: Option<EntityId>) -> Result<FieldValue, FieldIssue> {
    match value {
        None => Ok(FieldValue::Null),
        Some(id) if id.is_nil() => Err(FieldIssue::new(
            CREATED_BY.name,
            "must reference an existing profile",
        )),
        Some(id) => Ok(FieldValue::Reference(id)),
    }
}
