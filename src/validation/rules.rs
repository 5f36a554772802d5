//! Field predicates used by the draft validators.
//!
//! Predicates accept an empty value: "required" is a separate `length(min = 1)`
//! rule, so an empty field reports only that it is missing.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;
use validator::ValidationError;

use super::FieldError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// ASCII letters and digits only
pub fn alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(failure("alphanumeric", "Value has non-alphanumeric characters."))
    }
}

/// Genre names are 3 to 100 characters long
pub fn genre_name_length(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 || (3..=100).contains(&len) {
        Ok(())
    } else {
        Err(failure(
            "length",
            "Genre name must be between 3 and 100 characters.",
        ))
    }
}

/// ISO-8601 calendar date, optionally with a time part
pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || parse_iso_date(value).is_some() {
        Ok(())
    } else {
        Err(failure("iso_date", "Invalid date."))
    }
}

/// Well-formed record identifier
pub fn reference(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || Uuid::parse_str(value).is_ok() {
        Ok(())
    } else {
        Err(failure("reference", "Invalid reference."))
    }
}

/// Every member is a well-formed record identifier
pub fn references(values: &BTreeSet<String>) -> Result<(), ValidationError> {
    if values.iter().all(|v| Uuid::parse_str(v).is_ok()) {
        Ok(())
    } else {
        Err(failure("reference", "Invalid reference."))
    }
}

/// Parse `YYYY-MM-DD`, or keep the date part of an RFC 3339 timestamp
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// HTML-escape free text for safe embedding in rendered pages
pub fn escape(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}

/// Convert an already validated optional date field
pub fn optional_date(
    field: &'static str,
    value: Option<&str>,
    message: &'static str,
) -> Result<Option<NaiveDate>, FieldError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => parse_iso_date(raw)
            .map(Some)
            .ok_or_else(|| FieldError::new(field, "iso_date", message)),
    }
}

/// Convert an already validated reference field
pub fn reference_id(
    field: &'static str,
    value: &str,
    message: &'static str,
) -> Result<Uuid, FieldError> {
    Uuid::parse_str(value).map_err(|_| FieldError::new(field, "reference", message))
}
