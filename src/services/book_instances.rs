//! Book instances service

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{DeleteContext, DeleteOutcome, FormOutcome, Selectable};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInstance, BookInstanceDraft, BookInstanceStatus, EntityKind},
    repository::{CatalogStore, Removal},
    validation::{self, FieldError, FormDraft, FormPayload, Validated},
};

/// Copy with the book it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceDetail {
    pub instance: BookInstance,
    pub book: Option<Book>,
}

/// Copy create/update form with book and status choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceForm {
    pub id: Option<Uuid>,
    pub draft: BookInstanceDraft,
    pub books: Vec<Selectable<Book>>,
    pub statuses: Vec<Selectable<BookInstanceStatus>>,
}

#[derive(Clone)]
pub struct BookInstancesService {
    store: Arc<dyn CatalogStore>,
}

impl BookInstancesService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All copies in insertion order, each with its book
    pub async fn list(&self) -> AppResult<Vec<BookInstanceDetail>> {
        let (instances, books) =
            tokio::try_join!(self.store.list_book_instances(), self.store.list_books())?;
        Ok(instances
            .into_iter()
            .map(|instance| {
                let book = books.iter().find(|b| b.id == instance.book).cloned();
                BookInstanceDetail { instance, book }
            })
            .collect())
    }

    pub async fn get_detail(&self, id: Uuid) -> AppResult<BookInstanceDetail> {
        let instance = self.require(id).await?;
        let book = self.store.get_book(instance.book).await?;
        Ok(BookInstanceDetail { instance, book })
    }

    /// Form with every book and status; on update the current ones are selected
    pub async fn form_context(&self, id: Option<Uuid>) -> AppResult<BookInstanceForm> {
        let draft = match id {
            Some(id) => BookInstanceDraft::from(&self.require(id).await?),
            None => BookInstanceDraft::default(),
        };
        self.form(id, draft).await
    }

    pub async fn create(&self, payload: &FormPayload) -> AppResult<FormOutcome<BookInstanceForm>> {
        self.submit(None, payload).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &FormPayload,
    ) -> AppResult<FormOutcome<BookInstanceForm>> {
        self.require(id).await?;
        self.submit(Some(id), payload).await
    }

    async fn submit(
        &self,
        id: Option<Uuid>,
        payload: &FormPayload,
    ) -> AppResult<FormOutcome<BookInstanceForm>> {
        let draft = BookInstanceDraft::from_payload(payload);
        let instance = match validation::validate_draft(draft.clone()) {
            Validated::Invalid { errors, draft } => {
                return Ok(FormOutcome::rejected(errors, self.form(id, draft).await?));
            }
            Validated::Valid(instance) => instance,
        };

        if self.store.get_book(instance.book).await?.is_none() {
            let error = FieldError::new("book", "reference", "Book not found.");
            let form = self.form(id, draft.sanitize()).await?;
            return Ok(FormOutcome::rejected(vec![error], form));
        }

        match id {
            Some(id) => {
                if !self.store.update_book_instance(id, &instance).await? {
                    return Err(not_found(id));
                }
                tracing::info!("Book instance updated: {}", id);
                Ok(FormOutcome::Saved { id })
            }
            None => {
                let id = self.store.create_book_instance(&instance).await?;
                tracing::info!("Book instance created: {} ({})", id, instance.status);
                Ok(FormOutcome::Saved { id })
            }
        }
    }

    pub async fn delete_context(&self, id: Uuid) -> AppResult<DeleteContext<BookInstanceDetail>> {
        let Some(instance) = self.store.get_book_instance(id).await? else {
            return Ok(DeleteContext::AlreadyAbsent);
        };
        let book = self.store.get_book(instance.book).await?;
        Ok(DeleteContext::Found(BookInstanceDetail { instance, book }))
    }

    /// Copies have no dependents, so this never blocks
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<BookInstanceDetail>> {
        match self.store.delete_book_instance(id).await? {
            Removal::Removed => {
                tracing::info!("Book instance deleted: {}", id);
                Ok(DeleteOutcome::Deleted)
            }
            Removal::Missing => Ok(DeleteOutcome::AlreadyAbsent),
            Removal::Referenced => Err(AppError::Internal(format!(
                "Book instance {} unexpectedly referenced",
                id
            ))),
        }
    }

    async fn form(&self, id: Option<Uuid>, draft: BookInstanceDraft) -> AppResult<BookInstanceForm> {
        let books = self
            .store
            .list_books()
            .await?
            .into_iter()
            .map(|book| {
                let selected = draft.is_for_book(book.id);
                Selectable::new(book, selected)
            })
            .collect();
        let current = draft.status.parse::<BookInstanceStatus>().ok();
        let statuses = BookInstanceStatus::ALL
            .into_iter()
            .map(|status| Selectable::new(status, current == Some(status)))
            .collect();

        Ok(BookInstanceForm {
            id,
            draft,
            books,
            statuses,
        })
    }

    async fn require(&self, id: Uuid) -> AppResult<BookInstance> {
        self.store
            .get_book_instance(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(EntityKind::BookInstance, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBook;
    use crate::repository::MockCatalogStore;

    #[tokio::test]
    async fn test_update_form_selects_current_book_and_status() {
        let book = NewBook {
            title: "The Hobbit".to_string(),
            author: Uuid::new_v4(),
            summary: "s".to_string(),
            isbn: "i".to_string(),
            genre: vec![],
        }
        .with_id(Uuid::new_v4());
        let other = Book {
            id: Uuid::new_v4(),
            title: "Other".to_string(),
            ..book.clone()
        };
        let instance = BookInstance {
            id: Uuid::new_v4(),
            book: book.id,
            imprint: "Allen".to_string(),
            status: BookInstanceStatus::Loaned,
            due_back: None,
        };

        let mut store = MockCatalogStore::new();
        let found = instance.clone();
        store
            .expect_get_book_instance()
            .returning(move |_| Ok(Some(found.clone())));
        let books = vec![book.clone(), other];
        store
            .expect_list_books()
            .returning(move || Ok(books.clone()));

        let service = BookInstancesService::new(Arc::new(store));
        let form = service.form_context(Some(instance.id)).await.unwrap();

        let selected_books: Vec<Uuid> = form
            .books
            .iter()
            .filter(|b| b.selected)
            .map(|b| b.item.id)
            .collect();
        assert_eq!(selected_books, vec![book.id]);
        let selected_status: Vec<BookInstanceStatus> = form
            .statuses
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.item)
            .collect();
        assert_eq!(selected_status, vec![BookInstanceStatus::Loaned]);
    }

    #[tokio::test]
    async fn test_rejected_form_keeps_lowercase_status_selected() {
        let mut store = MockCatalogStore::new();
        store.expect_list_books().returning(|| Ok(vec![]));
        store.expect_create_book_instance().never();

        let service = BookInstancesService::new(Arc::new(store));
        let payload = FormPayload::new()
            .with("book", Uuid::new_v4().to_string())
            .with("imprint", "")
            .with("status", "loaned");

        match service.create(&payload).await.unwrap() {
            FormOutcome::Rejected(rejection) => {
                assert_eq!(rejection.errors.len(), 1);
                assert_eq!(rejection.errors[0].field, "imprint");
                let selected: Vec<BookInstanceStatus> = rejection
                    .form
                    .statuses
                    .iter()
                    .filter(|s| s.selected)
                    .map(|s| s.item)
                    .collect();
                assert_eq!(selected, vec![BookInstanceStatus::Loaned]);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
