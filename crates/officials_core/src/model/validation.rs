//! Form validation for official create/update requests.
//!
//! # Invariants
//! - Validation never touches the upload directory or the database; it only
//!   reads the pending upload to check its type and size.
//! - All failing fields are reported together, not just the first one.

use crate::model::official::Position;
use crate::storage::upload::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_KILOBYTES};
use crate::storage::UploadedImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIELD_NAME: &str = "name";
pub const FIELD_POSITION: &str = "position";
pub const FIELD_PROFILE_IMAGE: &str = "profile_image";

/// Raw create/update input as submitted by the admin form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficialForm {
    pub name: Option<String>,
    pub position: Option<String>,
    pub profile_image: Option<UploadedImage>,
    /// Only honored by update, and only when no new image is supplied.
    pub remove_image: bool,
}

/// Input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOfficial {
    pub name: String,
    pub position: Position,
    pub profile_image: Option<UploadedImage>,
    pub remove_image: bool,
}

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |message| (*field, message.as_str()))
        })
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (_, message) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

impl OfficialForm {
    /// Validates every field and returns the typed request or all errors.
    pub fn validate(self) -> Result<ValidatedOfficial, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_text(self.name, FIELD_NAME, &mut errors);
        let position = required_text(self.position, FIELD_POSITION, &mut errors).and_then(
            |label| {
                let position = Position::from_label(&label);
                if position.is_none() {
                    errors.add(FIELD_POSITION, "The selected position is invalid.");
                }
                position
            },
        );

        if let Some(upload) = &self.profile_image {
            validate_image(upload, &mut errors);
        }

        match (name, position) {
            (Some(name), Some(position)) if errors.is_empty() => Ok(ValidatedOfficial {
                name,
                position,
                profile_image: self.profile_image,
                remove_image: self.remove_image,
            }),
            _ => Err(errors),
        }
    }
}

fn required_text(
    value: Option<String>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() => Some(text),
        _ => {
            errors.add(field, format!("The {field} field is required."));
            None
        }
    }
}

fn validate_image(upload: &UploadedImage, errors: &mut ValidationErrors) {
    let inspection = match upload.inspect() {
        Ok(inspection) => inspection,
        Err(_) => {
            errors.add(FIELD_PROFILE_IMAGE, "The profile image failed to upload.");
            return;
        }
    };

    if inspection.kind.is_none() {
        errors.add(FIELD_PROFILE_IMAGE, "The profile image field must be an image.");
    }

    let extension_allowed = inspection
        .extension
        .as_deref()
        .is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext));
    if inspection.kind.is_none() || !extension_allowed {
        errors.add(
            FIELD_PROFILE_IMAGE,
            format!(
                "The profile image field must be a file of type: {}.",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            ),
        );
    }

    if inspection.size_bytes > MAX_IMAGE_KILOBYTES * 1024 {
        errors.add(
            FIELD_PROFILE_IMAGE,
            format!("The profile image field must not be greater than {MAX_IMAGE_KILOBYTES} kilobytes."),
        );
    }
}
