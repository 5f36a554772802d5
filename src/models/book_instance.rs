//! Book instance (physical copy) model and related types

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{format_long_date, EntityKind};
use crate::validation::{rules, FieldError, FormDraft, FormPayload};

/// Copy availability. No transition rules: any value can be set by an update.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "book_instance_status")]
pub enum BookInstanceStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Available,
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full book instance model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookInstance {
    pub id: Uuid,
    #[sqlx(rename = "book_id")]
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn url(&self) -> String {
        EntityKind::BookInstance.detail_path(self.id)
    }

    /// Long form of the due date, empty when unset
    pub fn due_back_formatted(&self) -> String {
        self.due_back.map(format_long_date).unwrap_or_default()
    }
}

/// Validated book instance fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookInstance {
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

impl NewBookInstance {
    pub fn with_id(self, id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book: self.book,
            imprint: self.imprint,
            status: self.status,
            due_back: self.due_back,
        }
    }
}

fn known_status(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.parse::<BookInstanceStatus>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("status"))
    }
}

/// Book instance form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BookInstanceDraft {
    #[validate(
        length(min = 1, message = "Book must be specified."),
        custom(function = "rules::reference", message = "Invalid book reference.")
    )]
    pub book: String,
    #[validate(length(min = 1, message = "Imprint must be specified."))]
    pub imprint: String,
    /// Empty means the default status
    #[validate(custom(function = "known_status", message = "Invalid status."))]
    pub status: String,
    #[validate(custom(function = "rules::iso_date", message = "Invalid date entered."))]
    pub due_back: Option<String>,
}

impl BookInstanceDraft {
    pub fn is_for_book(&self, book_id: Uuid) -> bool {
        self.book == book_id.to_string()
    }
}

impl FormDraft for BookInstanceDraft {
    type Value = NewBookInstance;

    const FIELDS: &'static [&'static str] = &["book", "imprint", "status", "due_back"];

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            book: payload.text("book"),
            imprint: payload.text("imprint"),
            status: payload.text("status"),
            due_back: payload.optional_text("due_back"),
        }
    }

    fn sanitize(self) -> Self {
        Self {
            book: rules::escape(&self.book),
            imprint: rules::escape(&self.imprint),
            status: rules::escape(&self.status),
            due_back: self.due_back.as_deref().map(rules::escape),
        }
    }

    fn build(&self) -> Result<NewBookInstance, FieldError> {
        let status = if self.status.is_empty() {
            BookInstanceStatus::default()
        } else {
            self.status
                .parse()
                .map_err(|_| FieldError::new("status", "status", "Invalid status."))?
        };

        Ok(NewBookInstance {
            book: rules::reference_id("book", &self.book, "Invalid book reference.")?,
            imprint: self.imprint.clone(),
            status,
            due_back: rules::optional_date(
                "due_back",
                self.due_back.as_deref(),
                "Invalid date entered.",
            )?,
        })
    }
}

impl From<&BookInstance> for BookInstanceDraft {
    fn from(instance: &BookInstance) -> Self {
        Self {
            book: instance.book.to_string(),
            imprint: instance.imprint.clone(),
            status: instance.status.to_string(),
            due_back: instance.due_back.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{process, Validated};

    fn payload(book: Uuid) -> FormPayload {
        FormPayload::new()
            .with("book", book.to_string())
            .with("imprint", "Allen & Unwin, 1937")
    }

    #[test]
    fn test_status_defaults_to_maintenance() {
        match process::<BookInstanceDraft>(&payload(Uuid::new_v4())) {
            Validated::Valid(instance) => {
                assert_eq!(instance.status, BookInstanceStatus::Maintenance);
                assert_eq!(instance.imprint, "Allen &amp; Unwin, 1937");
                assert_eq!(instance.due_back, None);
            }
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn test_status_and_due_back_parsed() {
        let form = payload(Uuid::new_v4())
            .with("status", "Loaned")
            .with("due_back", "2024-05-01");
        match process::<BookInstanceDraft>(&form) {
            Validated::Valid(instance) => {
                assert_eq!(instance.status, BookInstanceStatus::Loaned);
                assert_eq!(instance.due_back, NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let form = payload(Uuid::new_v4()).with("status", "Lost");
        match process::<BookInstanceDraft>(&form) {
            Validated::Invalid { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "status");
                assert_eq!(errors[0].message, "Invalid status.");
            }
            Validated::Valid(_) => panic!("unknown status accepted"),
        }
    }

    #[test]
    fn test_due_back_formatted() {
        let instance = NewBookInstance {
            book: Uuid::new_v4(),
            imprint: "Penguin".to_string(),
            status: BookInstanceStatus::Loaned,
            due_back: NaiveDate::from_ymd_opt(2024, 5, 1),
        }
        .with_id(Uuid::new_v4());
        assert_eq!(instance.due_back_formatted(), "May 1st, 2024");
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "available".parse::<BookInstanceStatus>(),
            Ok(BookInstanceStatus::Available)
        );
        assert!("".parse::<BookInstanceStatus>().is_err());
    }
}
