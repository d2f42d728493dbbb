//! Image field transformer.
//!
//! # Invariants
//! - Decode always yields the `Existing` variant.
//! - Encode never sees a resolved upload: `PendingUpload` is rejected, upload
//!   resolution happens before encode is called.

use crate::model::field::{FieldValue, ImageRef};
use crate::schema::{FieldIssue, FieldSpec};
use serde::{Deserialize, Serialize};

/// New image chosen in the editor, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Form value of an image field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageForm {
    Existing(ImageRef),
    PendingUpload(PendingUpload),
}

pub fn decode_image(stored: Option<&ImageRef>) -> Option<ImageForm> {
    stored.cloned().map(ImageForm::Existing)
}

pub fn encode_image(spec: &FieldSpec, form: Option<&ImageForm>) -> Result<FieldValue, FieldIssue> {
    match form {
        None => Ok(FieldValue::Null),
        Some(ImageForm::Existing(image)) if image.id.trim().is_empty() => Err(FieldIssue::new(
            spec.name,
            "image identifier must not be empty",
        )),
        Some(ImageForm::Existing(image)) => Ok(FieldValue::Image(image.clone())),
        Some(ImageForm::PendingUpload(upload)) => Err(FieldIssue::new(
            spec.name,
            format!(
                "upload `{}` must be resolved before saving",
                upload.file_name
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_image, encode_image, ImageForm, PendingUpload};
    use crate::model::field::{FieldValue, ImageRef};
    use crate::schema::{FieldKind, FieldSpec};

    const PHOTO: FieldSpec = FieldSpec::optional("photo", FieldKind::Image);

    #[test]
    fn stored_image_decodes_as_existing_and_passes_through() {
        let mut image = ImageRef::new("img-42");
        image.width = Some(640);
        image.alt = Some("canteiro".to_string());

        let form = decode_image(Some(&image)).unwrap();
        assert_eq!(form, ImageForm::Existing(image.clone()));
        assert_eq!(
            encode_image(&PHOTO, Some(&form)).unwrap(),
            FieldValue::Image(image)
        );
    }

    #[test]
    fn pending_upload_is_rejected() {
        let form = ImageForm::PendingUpload(PendingUpload {
            file_name: "horta.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
            alt: None,
        });
        let issue = encode_image(&PHOTO, Some(&form)).unwrap_err();
        assert_eq!(issue.path, "photo");
        assert!(issue.reason.contains("horta.jpg"));
    }

    #[test]
    fn absent_image_encodes_to_null() {
        assert_eq!(encode_image(&PHOTO, None).unwrap(), FieldValue::Null);
        assert_eq!(decode_image(None), None);
    }
}
