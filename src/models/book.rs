//! Book model and related types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::EntityKind;
use crate::validation::{rules, FieldError, FormDraft, FormPayload};

/// Full book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    #[sqlx(rename = "author_id")]
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    /// Genre references, sorted; some may no longer resolve
    #[sqlx(rename = "genre_ids")]
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn url(&self) -> String {
        EntityKind::Book.detail_path(self.id)
    }

    pub fn has_genre(&self, genre_id: Uuid) -> bool {
        self.genre.contains(&genre_id)
    }
}

/// Validated book fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl NewBook {
    pub fn with_id(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            summary: self.summary,
            isbn: self.isbn,
            genre: self.genre,
        }
    }
}

/// Book form as submitted. `genre` is already normalized to a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BookDraft {
    #[validate(length(min = 1, message = "Title must be specified."))]
    pub title: String,
    #[validate(
        length(min = 1, message = "Author must be specified."),
        custom(function = "rules::reference", message = "Invalid author reference.")
    )]
    pub author: String,
    #[validate(length(min = 1, message = "Summary must be specified."))]
    pub summary: String,
    #[validate(length(min = 1, message = "ISBN must be specified."))]
    pub isbn: String,
    #[validate(custom(function = "rules::references", message = "Invalid genre reference."))]
    pub genre: BTreeSet<String>,
}

impl BookDraft {
    /// Whether the draft currently references this genre
    pub fn has_genre(&self, genre_id: Uuid) -> bool {
        self.genre.contains(&genre_id.to_string())
    }
}

impl FormDraft for BookDraft {
    type Value = NewBook;

    const FIELDS: &'static [&'static str] = &["title", "author", "summary", "isbn", "genre"];

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            title: payload.text("title"),
            author: payload.text("author"),
            summary: payload.text("summary"),
            isbn: payload.text("isbn"),
            genre: payload.reference_set("genre"),
        }
    }

    fn sanitize(self) -> Self {
        Self {
            title: rules::escape(&self.title),
            author: rules::escape(&self.author),
            summary: rules::escape(&self.summary),
            isbn: rules::escape(&self.isbn),
            genre: self.genre.iter().map(|g| rules::escape(g)).collect(),
        }
    }

    fn build(&self) -> Result<NewBook, FieldError> {
        let author = rules::reference_id("author", &self.author, "Invalid author reference.")?;
        let genre = self
            .genre
            .iter()
            .map(|g| rules::reference_id("genre", g, "Invalid genre reference."))
            .collect::<Result<BTreeSet<Uuid>, _>>()?;

        Ok(NewBook {
            title: self.title.clone(),
            author,
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre: genre.into_iter().collect(),
        })
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.to_string(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(Uuid::to_string).collect(),
        }
    }
}
