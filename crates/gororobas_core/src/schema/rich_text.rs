//! Rich-text field transformer.
//!
//! Storage keeps an optional document; the form always holds a document so
//! the editor has a valid starting state.

use crate::model::document::Document;
use crate::model::field::FieldValue;
use crate::schema::{FieldIssue, FieldSpec};

/// Storage -> form. A missing document becomes the editor's empty state.
pub fn decode_rich_text(stored: Option<&Document>) -> Document {
    stored.cloned().unwrap_or_else(Document::empty)
}

/// Form -> storage.
///
/// Every document must pass `Document::validate` first, with the shape path
/// appended to the field name. Only a well-formed blank document is stored
/// as `Null` (or rejected when the field is required).
pub fn encode_rich_text(spec: &FieldSpec, document: &Document) -> Result<FieldValue, FieldIssue> {
    document.validate().map_err(|err| {
        FieldIssue::new(
            format!("{}/{}", spec.name, err.path()),
            err.violation().to_string(),
        )
    })?;

    if document.is_blank() {
        if spec.required {
            return Err(FieldIssue::new(spec.name, "must not be empty"));
        }
        return Ok(FieldValue::Null);
    }
    Ok(FieldValue::RichText(document.clone()))
}
