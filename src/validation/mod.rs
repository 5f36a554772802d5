//! Validation and sanitization of submitted forms.
//!
//! A submission goes through three pure steps:
//!
//! 1. normalization: [`FormPayload`] → draft (trimmed text, optional fields
//!    collapsed to `None`, multi-valued fields turned into sets);
//! 2. validation: the draft's `validator` rules, every failure collected;
//! 3. sanitization: free text HTML-escaped, then the typed value is built.
//!
//! The outcome is [`Validated`]: the typed value, or the field errors plus the
//! sanitized draft for re-display.

pub mod form;
pub mod rules;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

pub use form::{FormPayload, FormValue};

/// One failed rule on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    /// Rule identifier, e.g. `length`, `alphanumeric`, `iso_date`
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Normalized form input for one entity kind
pub trait FormDraft: Validate + Sized {
    /// Typed value produced by a valid draft
    type Value;

    /// Field names in form order, used to order reported errors
    const FIELDS: &'static [&'static str];

    fn from_payload(payload: &FormPayload) -> Self;

    /// HTML-escape every free-text field
    fn sanitize(self) -> Self;

    /// Convert a sanitized, valid draft into its typed value
    fn build(&self) -> Result<Self::Value, FieldError>;
}

/// Result of running a draft through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<D: FormDraft> {
    Valid(D::Value),
    Invalid { errors: Vec<FieldError>, draft: D },
}

/// Normalize, validate and sanitize a submitted form
pub fn process<D: FormDraft>(payload: &FormPayload) -> Validated<D> {
    validate_draft(D::from_payload(payload))
}

/// Validate and sanitize an already normalized draft
pub fn validate_draft<D: FormDraft>(draft: D) -> Validated<D> {
    let checked = draft.validate();
    let draft = draft.sanitize();

    if let Err(errors) = checked {
        return Validated::Invalid {
            errors: collect_errors(&errors, D::FIELDS),
            draft,
        };
    }

    match draft.build() {
        Ok(value) => Validated::Valid(value),
        Err(error) => Validated::Invalid {
            errors: vec![error],
            draft,
        },
    }
}

/// Flatten `validator` errors, ordered by form field then rule order
fn collect_errors(errors: &ValidationErrors, fields: &[&str]) -> Vec<FieldError> {
    let mut flat: Vec<(usize, FieldError)> = Vec::new();

    for (name, list) in errors.field_errors() {
        let name: &str = &name;
        let position = fields
            .iter()
            .position(|f| *f == name)
            .unwrap_or(fields.len());
        for err in list.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            flat.push((position, FieldError::new(name, err.code.clone(), message)));
        }
    }

    flat.sort_by_key(|(position, _)| *position);
    flat.into_iter().map(|(_, error)| error).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorDraft, GenreDraft};

    #[test]
    fn test_errors_follow_form_order() {
        let payload = FormPayload::new()
            .with("first_name", "")
            .with("family_name", "D'oh")
            .with("date_of_death", "not a date");

        match process::<AuthorDraft>(&payload) {
            Validated::Invalid { errors, .. } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["first_name", "family_name", "date_of_death"]);
            }
            Validated::Valid(_) => panic!("expected validation errors"),
        }
    }

    #[test]
    fn test_invalid_draft_is_sanitized() {
        let payload = FormPayload::new().with("name", "<b");
        match process::<GenreDraft>(&payload) {
            Validated::Invalid { errors, draft } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, "length");
                assert_eq!(draft.name, "&lt;b");
            }
            Validated::Valid(_) => panic!("two characters is too short"),
        }
    }
}
