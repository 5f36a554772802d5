//! Authors service

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{DeleteContext, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorDraft, Book, EntityKind},
    repository::{CatalogStore, Removal},
    validation::{self, FormPayload, Validated},
};

/// Author with the books written by them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

/// Author create/update form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorForm {
    /// Record being edited, `None` on create
    pub id: Option<Uuid>,
    pub draft: AuthorDraft,
}

/// Author delete confirmation; `books` block the delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorDelete {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Clone)]
pub struct AuthorsService {
    store: Arc<dyn CatalogStore>,
}

impl AuthorsService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All authors by family name
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.store.list_authors().await
    }

    /// Author plus their books
    pub async fn get_detail(&self, id: Uuid) -> AppResult<AuthorDetail> {
        let (author, books) = tokio::try_join!(
            self.store.get_author(id),
            self.store.list_books_by_author(id)
        )?;
        let author = author.ok_or_else(|| not_found(id))?;
        Ok(AuthorDetail { author, books })
    }

    /// Empty form, or the existing author pre-filled
    pub async fn form_context(&self, id: Option<Uuid>) -> AppResult<AuthorForm> {
        let draft = match id {
            Some(id) => AuthorDraft::from(&self.require(id).await?),
            None => AuthorDraft::default(),
        };
        Ok(AuthorForm { id, draft })
    }

    pub async fn create(&self, payload: &FormPayload) -> AppResult<FormOutcome<AuthorForm>> {
        match validation::process::<AuthorDraft>(payload) {
            Validated::Invalid { errors, draft } => {
                Ok(FormOutcome::rejected(errors, AuthorForm { id: None, draft }))
            }
            Validated::Valid(author) => {
                let id = self.store.create_author(&author).await?;
                tracing::info!("Author created: {}", id);
                Ok(FormOutcome::Saved { id })
            }
        }
    }

    /// Replace every field of an existing author
    pub async fn update(
        &self,
        id: Uuid,
        payload: &FormPayload,
    ) -> AppResult<FormOutcome<AuthorForm>> {
        self.require(id).await?;

        match validation::process::<AuthorDraft>(payload) {
            Validated::Invalid { errors, draft } => Ok(FormOutcome::rejected(
                errors,
                AuthorForm { id: Some(id), draft },
            )),
            Validated::Valid(author) => {
                if !self.store.update_author(id, &author).await? {
                    return Err(not_found(id));
                }
                tracing::info!("Author updated: {}", id);
                Ok(FormOutcome::Saved { id })
            }
        }
    }

    pub async fn delete_context(&self, id: Uuid) -> AppResult<DeleteContext<AuthorDelete>> {
        let (author, books) = tokio::try_join!(
            self.store.get_author(id),
            self.store.list_books_by_author(id)
        )?;
        Ok(match author {
            Some(author) => DeleteContext::Found(AuthorDelete { author, books }),
            None => DeleteContext::AlreadyAbsent,
        })
    }

    /// Delete an author that has no books
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<AuthorDelete>> {
        let context = match self.delete_context(id).await? {
            DeleteContext::Found(context) => context,
            DeleteContext::AlreadyAbsent => return Ok(DeleteOutcome::AlreadyAbsent),
        };
        if !context.books.is_empty() {
            tracing::warn!(
                "Author {} not deleted: {} book(s) still reference it",
                id,
                context.books.len()
            );
            return Ok(DeleteOutcome::Blocked(context));
        }

        match self.store.delete_author(id).await? {
            Removal::Removed => {
                tracing::info!("Author deleted: {}", id);
                Ok(DeleteOutcome::Deleted)
            }
            Removal::Missing => Ok(DeleteOutcome::AlreadyAbsent),
            Removal::Referenced => {
                tracing::warn!("Author {} gained books before delete", id);
                Ok(match self.delete_context(id).await? {
                    DeleteContext::Found(context) => DeleteOutcome::Blocked(context),
                    DeleteContext::AlreadyAbsent => DeleteOutcome::AlreadyAbsent,
                })
            }
        }
    }

    async fn require(&self, id: Uuid) -> AppResult<Author> {
        self.store
            .get_author(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(EntityKind::Author, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBook;
    use crate::repository::MockCatalogStore;

    fn author(id: Uuid) -> Author {
        Author {
            id,
            first_name: "John".to_string(),
            family_name: "Tolkien".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[tokio::test]
    async fn test_update_missing_author_is_not_found() {
        let mut store = MockCatalogStore::new();
        store.expect_get_author().returning(|_| Ok(None));
        store.expect_update_author().never();

        let service = AuthorsService::new(Arc::new(store));
        let payload = FormPayload::new()
            .with("first_name", "John")
            .with("family_name", "Tolkien");
        let err = service.update(Uuid::new_v4(), &payload).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_store_reports_referenced_after_check() {
        let id = Uuid::new_v4();
        let late_book = NewBook {
            title: "Late".to_string(),
            author: id,
            summary: "s".to_string(),
            isbn: "i".to_string(),
            genre: vec![],
        }
        .with_id(Uuid::new_v4());

        let mut store = MockCatalogStore::new();
        store
            .expect_get_author()
            .returning(move |id| Ok(Some(author(id))));
        let mut calls = 0;
        store.expect_list_books_by_author().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![])
            } else {
                Ok(vec![late_book.clone()])
            }
        });
        store
            .expect_delete_author()
            .times(1)
            .returning(|_| Ok(Removal::Referenced));

        let service = AuthorsService::new(Arc::new(store));
        match service.delete(id).await.unwrap() {
            DeleteOutcome::Blocked(context) => assert_eq!(context.books.len(), 1),
            other => panic!("expected blocked delete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut store = MockCatalogStore::new();
        store
            .expect_list_authors()
            .returning(|| Err(AppError::Internal("connection reset".to_string())));

        let service = AuthorsService::new(Arc::new(store));
        let err = service.list().await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
