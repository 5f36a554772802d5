//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::EntityKind;
use crate::validation::{rules, FieldError, FormDraft, FormPayload};

/// Genre record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        EntityKind::Genre.detail_path(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
}

impl NewGenre {
    pub fn with_id(self, id: Uuid) -> Genre {
        Genre { id, name: self.name }
    }
}

/// Genre form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GenreDraft {
    #[validate(
        length(min = 1, message = "A Genre name is required."),
        custom(function = "rules::genre_name_length")
    )]
    pub name: String,
}

impl FormDraft for GenreDraft {
    type Value = NewGenre;

    const FIELDS: &'static [&'static str] = &["name"];

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            name: payload.text("name"),
        }
    }

    fn sanitize(self) -> Self {
        Self {
            name: rules::escape(&self.name),
        }
    }

    fn build(&self) -> Result<NewGenre, FieldError> {
        Ok(NewGenre {
            name: self.name.clone(),
        })
    }
}

impl From<&Genre> for GenreDraft {
    fn from(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{process, Validated};

    #[test]
    fn test_missing_name() {
        match process::<GenreDraft>(&FormPayload::new()) {
            Validated::Invalid { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "A Genre name is required.");
            }
            Validated::Valid(_) => panic!("missing name accepted"),
        }
    }

    #[test]
    fn test_name_is_escaped() {
        let payload = FormPayload::new().with("name", "  Sword & Sorcery ");
        match process::<GenreDraft>(&payload) {
            Validated::Valid(genre) => assert_eq!(genre.name, "Sword &amp; Sorcery"),
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }
}
