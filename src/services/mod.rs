//! Catalog use cases
//!
//! Each service wraps the shared [`CatalogStore`] and returns typed outcomes:
//! a rejected form or a blocked delete is a normal result, not an error.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{repository::CatalogStore, validation::FieldError};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub books: books::BooksService,
    pub book_instances: book_instances::BookInstancesService,
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services over one shared store
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            authors: authors::AuthorsService::new(store.clone()),
            genres: genres::GenresService::new(store.clone()),
            books: books::BooksService::new(store.clone()),
            book_instances: book_instances::BookInstancesService::new(store.clone()),
            catalog: catalog::CatalogService::new(store),
        }
    }
}

/// Result of a create or update submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FormOutcome<F> {
    /// Record written; redirect to its detail page
    Saved { id: Uuid },
    /// A genre with the same name already exists; nothing was written
    Existing { id: Uuid },
    /// Input failed validation; redisplay the form
    Rejected(Rejection<F>),
}

impl<F> FormOutcome<F> {
    pub(crate) fn rejected(errors: Vec<FieldError>, form: F) -> Self {
        FormOutcome::Rejected(Rejection { errors, form })
    }

    /// Id of the saved or already existing record
    pub fn id(&self) -> Option<Uuid> {
        match self {
            FormOutcome::Saved { id } | FormOutcome::Existing { id } => Some(*id),
            FormOutcome::Rejected(_) => None,
        }
    }
}

/// Field errors plus everything needed to render the form again
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection<F> {
    pub errors: Vec<FieldError>,
    pub form: F,
}

/// Data for a delete confirmation page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "context", rename_all = "snake_case")]
pub enum DeleteContext<T> {
    Found(T),
    /// Nothing to delete; the caller goes back to the list page
    AlreadyAbsent,
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "context", rename_all = "snake_case")]
pub enum DeleteOutcome<T> {
    Deleted,
    AlreadyAbsent,
    /// Dependents exist; nothing was removed
    Blocked(T),
}

/// A reference option on a form, flagged when it matches the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selectable<T> {
    pub item: T,
    pub selected: bool,
}

impl<T> Selectable<T> {
    pub fn new(item: T, selected: bool) -> Self {
        Self { item, selected }
    }
}
