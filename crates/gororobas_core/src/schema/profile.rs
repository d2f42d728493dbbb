//! Profile schema.
//!
//! # Invariants
//! - `name` is non-blank and `handle` follows the public handle rule.
//! - Absent `location` is `""` in the form and `Null` in storage.
//! - Blank `bio` is stored as `Null`.

use crate::model::document::Document;
use crate::model::field::{EntityId, EntityKind, StorageRecord};
use crate::schema::image::{decode_image, encode_image, ImageForm};
use crate::schema::rich_text::{decode_rich_text, encode_rich_text};
use crate::schema::{
    encode_handle, encode_optional_text, encode_required_text, EntitySchema, FieldKind,
    FieldReader, FieldSpec, RecordWriter, ValidationError,
};
use serde::{Deserialize, Serialize};

const NAME: FieldSpec = FieldSpec::required("name", FieldKind::Text);
const HANDLE: FieldSpec = FieldSpec::required("handle", FieldKind::Text);
const LOCATION: FieldSpec = FieldSpec::optional("location", FieldKind::Text);
const PHOTO: FieldSpec = FieldSpec::optional("photo", FieldKind::Image);
const BIO: FieldSpec = FieldSpec::optional("bio", FieldKind::RichText);

/// Declared profile fields.
pub const PROFILE_FIELDS: &[FieldSpec] = &[NAME, HANDLE, LOCATION, PHOTO, BIO];

/// Editable profile shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub id: EntityId,
    pub name: String,
    pub handle: String,
    pub location: String,
    pub photo: Option<ImageForm>,
    pub bio: Document,
}

impl ProfileForm {
    /// Starting state for a profile that has no stored data yet.
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            handle: String::new(),
            location: String::new(),
            photo: None,
            bio: Document::empty(),
        }
    }
}

pub struct ProfileSchema;

impl EntitySchema for ProfileSchema {
    type Form = ProfileForm;

    const KIND: EntityKind = EntityKind::Profile;

    fn decode(record: &StorageRecord) -> Result<ProfileForm, ValidationError> {
        let mut reader = FieldReader::new(Self::KIND, record);
        let form = ProfileForm {
            id: reader.id(),
            name: reader.text(&NAME).unwrap_or_default(),
            handle: reader.text(&HANDLE).unwrap_or_default(),
            location: reader.text(&LOCATION).unwrap_or_default(),
            photo: decode_image(reader.image(&PHOTO)),
            bio: decode_rich_text(reader.rich_text(&BIO)),
        };
        reader.finish(form)
    }

    fn encode(form: &ProfileForm) -> Result<StorageRecord, ValidationError> {
        let mut writer = RecordWriter::new(Self::KIND, form.id);
        writer.put(&NAME, encode_required_text(&NAME, &form.name));
        writer.put(&HANDLE, encode_handle(&HANDLE, &form.handle));
        writer.set(&LOCATION, encode_optional_text(&form.location));
        writer.put(&PHOTO, encode_image(&PHOTO, form.photo.as_ref()));
        writer.put(&BIO, encode_rich_text(&BIO, &form.bio));
        writer.finish(PROFILE_FIELDS)
    }
}
