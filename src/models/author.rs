//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{format_long_date, EntityKind};
use crate::validation::{rules, FieldError, FormDraft, FormPayload};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Display name: "family_name, first_name"
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn url(&self) -> String {
        EntityKind::Author.detail_path(self.id)
    }

    /// "b: January 3rd, 1892 - d: September 2nd, 1973", with "no date" for unset dates
    pub fn lifespan(&self) -> String {
        let show = |date: Option<NaiveDate>| {
            date.map(format_long_date)
                .unwrap_or_else(|| "no date".to_string())
        };
        format!(
            "b: {} - d: {}",
            show(self.date_of_birth),
            show(self.date_of_death)
        )
    }

    /// Birth date as `YYYY-MM-DD` for form inputs, empty when unset
    pub fn date_of_birth_iso(&self) -> String {
        iso(self.date_of_birth)
    }

    /// Death date as `YYYY-MM-DD` for form inputs, empty when unset
    pub fn date_of_death_iso(&self) -> String {
        iso(self.date_of_death)
    }
}

fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Validated author fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl NewAuthor {
    pub fn with_id(self, id: Uuid) -> Author {
        Author {
            id,
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

/// Author form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuthorDraft {
    #[validate(
        length(min = 1, message = "First name must be specified."),
        custom(
            function = "rules::alphanumeric",
            message = "First name has non-alphanumeric characters."
        )
    )]
    pub first_name: String,
    #[validate(
        length(min = 1, message = "Family name must be specified."),
        custom(
            function = "rules::alphanumeric",
            message = "Family name has non-alphanumeric characters."
        )
    )]
    pub family_name: String,
    #[validate(custom(function = "rules::iso_date", message = "Invalid date of birth."))]
    pub date_of_birth: Option<String>,
    #[validate(custom(function = "rules::iso_date", message = "Invalid date of death."))]
    pub date_of_death: Option<String>,
}

impl FormDraft for AuthorDraft {
    type Value = NewAuthor;

    const FIELDS: &'static [&'static str] =
        &["first_name", "family_name", "date_of_birth", "date_of_death"];

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            first_name: payload.text("first_name"),
            family_name: payload.text("family_name"),
            date_of_birth: payload.optional_text("date_of_birth"),
            date_of_death: payload.optional_text("date_of_death"),
        }
    }

    fn sanitize(self) -> Self {
        Self {
            first_name: rules::escape(&self.first_name),
            family_name: rules::escape(&self.family_name),
            date_of_birth: self.date_of_birth.as_deref().map(rules::escape),
            date_of_death: self.date_of_death.as_deref().map(rules::escape),
        }
    }

    fn build(&self) -> Result<NewAuthor, FieldError> {
        Ok(NewAuthor {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: rules::optional_date(
                "date_of_birth",
                self.date_of_birth.as_deref(),
                "Invalid date of birth.",
            )?,
            date_of_death: rules::optional_date(
                "date_of_death",
                self.date_of_death.as_deref(),
                "Invalid date of death.",
            )?,
        })
    }
}

impl From<&Author> for AuthorDraft {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: author.date_of_birth.map(|_| author.date_of_birth_iso()),
            date_of_death: author.date_of_death.map(|_| author.date_of_death_iso()),
        }
    }
}
