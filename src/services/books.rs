//! Books service

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{DeleteContext, DeleteOutcome, FormOutcome, Selectable};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookDraft, BookInstance, EntityKind, Genre},
    repository::{CatalogStore, Removal},
    validation::{self, FieldError, FormDraft, FormPayload, Validated},
};

/// Book list entry with its author resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub book: Book,
    pub author: Option<Author>,
}

/// Book with its author, genres and copies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    /// Resolved genres by name; ids that no longer resolve are left out
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstance>,
}

/// Book create/update form with author and genre choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookForm {
    pub id: Option<Uuid>,
    pub draft: BookDraft,
    pub authors: Vec<Selectable<Author>>,
    pub genres: Vec<Selectable<Genre>>,
}

/// Book delete confirmation; `instances` block the delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDelete {
    pub book: Book,
    pub instances: Vec<BookInstance>,
}

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn CatalogStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All books in insertion order, each with its author
    pub async fn list(&self) -> AppResult<Vec<BookSummary>> {
        let (books, authors) = tokio::try_join!(self.store.list_books(), self.store.list_authors())?;
        Ok(books
            .into_iter()
            .map(|book| {
                let author = authors.iter().find(|a| a.id == book.author).cloned();
                BookSummary { book, author }
            })
            .collect())
    }

    pub async fn get_detail(&self, id: Uuid) -> AppResult<BookDetail> {
        let (book, instances) = tokio::try_join!(
            self.store.get_book(id),
            self.store.list_book_instances_by_book(id)
        )?;
        let book = book.ok_or_else(|| not_found(id))?;

        let (author, genres) =
            tokio::try_join!(self.store.get_author(book.author), self.store.list_genres())?;
        let genres = genres.into_iter().filter(|g| book.has_genre(g.id)).collect();

        Ok(BookDetail {
            book,
            author,
            genres,
            instances,
        })
    }

    /// Form with every author and genre; on update the current ones are selected
    pub async fn form_context(&self, id: Option<Uuid>) -> AppResult<BookForm> {
        let draft = match id {
            Some(id) => BookDraft::from(&self.require(id).await?),
            None => BookDraft::default(),
        };
        self.form(id, draft).await
    }

    pub async fn create(&self, payload: &FormPayload) -> AppResult<FormOutcome<BookForm>> {
        self.submit(None, payload).await
    }

    pub async fn update(&self, id: Uuid, payload: &FormPayload) -> AppResult<FormOutcome<BookForm>> {
        self.require(id).await?;
        self.submit(Some(id), payload).await
    }

    async fn submit(&self, id: Option<Uuid>, payload: &FormPayload) -> AppResult<FormOutcome<BookForm>> {
        let draft = BookDraft::from_payload(payload);
        let book = match validation::validate_draft(draft.clone()) {
            Validated::Invalid { errors, draft } => {
                return Ok(FormOutcome::rejected(errors, self.form(id, draft).await?));
            }
            Validated::Valid(book) => book,
        };

        if self.store.get_author(book.author).await?.is_none() {
            let error = FieldError::new("author", "reference", "Author not found.");
            let form = self.form(id, draft.sanitize()).await?;
            return Ok(FormOutcome::rejected(vec![error], form));
        }

        match id {
            Some(id) => {
                if !self.store.update_book(id, &book).await? {
                    return Err(not_found(id));
                }
                tracing::info!("Book updated: {}", id);
                Ok(FormOutcome::Saved { id })
            }
            None => {
                let id = self.store.create_book(&book).await?;
                tracing::info!("Book created: {}", id);
                Ok(FormOutcome::Saved { id })
            }
        }
    }

    pub async fn delete_context(&self, id: Uuid) -> AppResult<DeleteContext<BookDelete>> {
        let (book, instances) = tokio::try_join!(
            self.store.get_book(id),
            self.store.list_book_instances_by_book(id)
        )?;
        Ok(match book {
            Some(book) => DeleteContext::Found(BookDelete { book, instances }),
            None => DeleteContext::AlreadyAbsent,
        })
    }

    /// Delete a book that has no copies
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<BookDelete>> {
        let context = match self.delete_context(id).await? {
            DeleteContext::Found(context) => context,
            DeleteContext::AlreadyAbsent => return Ok(DeleteOutcome::AlreadyAbsent),
        };
        if !context.instances.is_empty() {
            tracing::warn!(
                "Book {} not deleted: {} copy(ies) still exist",
                id,
                context.instances.len()
            );
            return Ok(DeleteOutcome::Blocked(context));
        }

        match self.store.delete_book(id).await? {
            Removal::Removed => {
                tracing::info!("Book deleted: {}", id);
                Ok(DeleteOutcome::Deleted)
            }
            Removal::Missing => Ok(DeleteOutcome::AlreadyAbsent),
            Removal::Referenced => {
                tracing::warn!("Book {} gained copies before delete", id);
                Ok(match self.delete_context(id).await? {
                    DeleteContext::Found(context) => DeleteOutcome::Blocked(context),
                    DeleteContext::AlreadyAbsent => DeleteOutcome::AlreadyAbsent,
                })
            }
        }
    }

    async fn form(&self, id: Option<Uuid>, draft: BookDraft) -> AppResult<BookForm> {
        let (authors, genres) =
            tokio::try_join!(self.store.list_authors(), self.store.list_genres())?;

        let authors = authors
            .into_iter()
            .map(|author| {
                let selected = draft.author == author.id.to_string();
                Selectable::new(author, selected)
            })
            .collect();
        let genres = genres
            .into_iter()
            .map(|genre| {
                let selected = draft.has_genre(genre.id);
                Selectable::new(genre, selected)
            })
            .collect();

        Ok(BookForm {
            id,
            draft,
            authors,
            genres,
        })
    }

    async fn require(&self, id: Uuid) -> AppResult<Book> {
        self.store.get_book(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(EntityKind::Book, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCatalogStore;

    #[tokio::test]
    async fn test_unknown_author_is_a_field_error() {
        let mut store = MockCatalogStore::new();
        store.expect_get_author().returning(|_| Ok(None));
        store.expect_list_authors().returning(|| Ok(vec![]));
        store.expect_list_genres().returning(|| Ok(vec![]));
        store.expect_create_book().never();

        let service = BooksService::new(Arc::new(store));
        let payload = FormPayload::new()
            .with("title", "Orphan")
            .with("author", Uuid::new_v4().to_string())
            .with("summary", "No author")
            .with("isbn", "000");

        match service.create(&payload).await.unwrap() {
            FormOutcome::Rejected(rejection) => {
                assert_eq!(rejection.errors.len(), 1);
                assert_eq!(rejection.errors[0].field, "author");
                assert_eq!(rejection.form.draft.title, "Orphan");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
