//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use author::{Author, AuthorDraft, NewAuthor};
pub use book::{Book, BookDraft, NewBook};
pub use book_instance::{BookInstance, BookInstanceDraft, BookInstanceStatus, NewBookInstance};
pub use genre::{Genre, GenreDraft, NewGenre};

/// The four catalog entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Author,
    Genre,
    Book,
    BookInstance,
}

impl EntityKind {
    /// Path segment used in detail urls
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Genre => "genre",
            EntityKind::Book => "book",
            EntityKind::BookInstance => "bookinstance",
        }
    }

    /// Path of the list page, where callers land after a delete
    pub fn list_path(&self) -> &'static str {
        match self {
            EntityKind::Author => "/catalog/authors",
            EntityKind::Genre => "/catalog/genres",
            EntityKind::Book => "/catalog/books",
            EntityKind::BookInstance => "/catalog/bookinstances",
        }
    }

    /// Canonical detail path for a record of this kind
    pub fn detail_path(&self, id: uuid::Uuid) -> String {
        format!("/catalog/{}/{}", self.slug(), id)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityKind::Author => "Author",
            EntityKind::Genre => "Genre",
            EntityKind::Book => "Book",
            EntityKind::BookInstance => "Book copy",
        };
        write!(f, "{}", label)
    }
}

/// Long display form of a date, e.g. "January 3rd, 1892"
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}
