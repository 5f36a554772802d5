//! Genres service

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{DeleteContext, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Book, EntityKind, Genre, GenreDraft},
    repository::{CatalogStore, Removal},
    validation::{self, FormPayload, Validated},
};

/// Genre with the books carrying it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDetail {
    pub genre: Genre,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreForm {
    pub id: Option<Uuid>,
    pub draft: GenreDraft,
}

/// Genre delete confirmation; `books` block the delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDelete {
    pub genre: Genre,
    pub books: Vec<Book>,
}

#[derive(Clone)]
pub struct GenresService {
    store: Arc<dyn CatalogStore>,
}

impl GenresService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All genres by name
    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.store.list_genres().await
    }

    pub async fn get_detail(&self, id: Uuid) -> AppResult<GenreDetail> {
        let (genre, books) = tokio::try_join!(
            self.store.get_genre(id),
            self.store.list_books_by_genre(id)
        )?;
        let genre = genre.ok_or_else(|| not_found(id))?;
        Ok(GenreDetail { genre, books })
    }

    pub async fn form_context(&self, id: Option<Uuid>) -> AppResult<GenreForm> {
        let draft = match id {
            Some(id) => GenreDraft::from(&self.require(id).await?),
            None => GenreDraft::default(),
        };
        Ok(GenreForm { id, draft })
    }

    /// Create a genre, or return the one that already has this exact name
    pub async fn create(&self, payload: &FormPayload) -> AppResult<FormOutcome<GenreForm>> {
        let genre = match validation::process::<GenreDraft>(payload) {
            Validated::Invalid { errors, draft } => {
                return Ok(FormOutcome::rejected(errors, GenreForm { id: None, draft }));
            }
            Validated::Valid(genre) => genre,
        };

        if let Some(existing) = self.store.find_genre_by_name(&genre.name).await? {
            tracing::debug!("Genre '{}' already exists: {}", genre.name, existing.id);
            return Ok(FormOutcome::Existing { id: existing.id });
        }

        let id = self.store.create_genre(&genre).await?;
        tracing::info!("Genre created: {}", id);
        Ok(FormOutcome::Saved { id })
    }

    /// Rename a genre. Names are not deduplicated here.
    pub async fn update(&self, id: Uuid, payload: &FormPayload) -> AppResult<FormOutcome<GenreForm>> {
        self.require(id).await?;

        match validation::process::<GenreDraft>(payload) {
            Validated::Invalid { errors, draft } => Ok(FormOutcome::rejected(
                errors,
                GenreForm { id: Some(id), draft },
            )),
            Validated::Valid(genre) => {
                if !self.store.update_genre(id, &genre).await? {
                    return Err(not_found(id));
                }
                tracing::info!("Genre updated: {}", id);
                Ok(FormOutcome::Saved { id })
            }
        }
    }

    pub async fn delete_context(&self, id: Uuid) -> AppResult<DeleteContext<GenreDelete>> {
        let (genre, books) = tokio::try_join!(
            self.store.get_genre(id),
            self.store.list_books_by_genre(id)
        )?;
        Ok(match genre {
            Some(genre) => DeleteContext::Found(GenreDelete { genre, books }),
            None => DeleteContext::AlreadyAbsent,
        })
    }

    /// Delete a genre no book carries
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<GenreDelete>> {
        let context = match self.delete_context(id).await? {
            DeleteContext::Found(context) => context,
            DeleteContext::AlreadyAbsent => return Ok(DeleteOutcome::AlreadyAbsent),
        };
        if !context.books.is_empty() {
            tracing::warn!(
                "Genre {} not deleted: carried by {} book(s)",
                id,
                context.books.len()
            );
            return Ok(DeleteOutcome::Blocked(context));
        }

        match self.store.delete_genre(id).await? {
            Removal::Removed => {
                tracing::info!("Genre deleted: {}", id);
                Ok(DeleteOutcome::Deleted)
            }
            Removal::Missing => Ok(DeleteOutcome::AlreadyAbsent),
            Removal::Referenced => {
                tracing::warn!("Genre {} was assigned to a book before delete", id);
                Ok(match self.delete_context(id).await? {
                    DeleteContext::Found(context) => DeleteOutcome::Blocked(context),
                    DeleteContext::AlreadyAbsent => DeleteOutcome::AlreadyAbsent,
                })
            }
        }
    }

    async fn require(&self, id: Uuid) -> AppResult<Genre> {
        self.store
            .get_genre(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(EntityKind::Genre, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCatalogStore;

    #[tokio::test]
    async fn test_existing_name_short_circuits() {
        let existing = Uuid::new_v4();
        let mut store = MockCatalogStore::new();
        store
            .expect_find_genre_by_name()
            .withf(|name| name == "Fantasy")
            .returning(move |name| {
                Ok(Some(Genre {
                    id: existing,
                    name: name.to_string(),
                }))
            });
        store.expect_create_genre().never();

        let service = GenresService::new(Arc::new(store));
        let outcome = service
            .create(&FormPayload::new().with("name", "Fantasy"))
            .await
            .unwrap();
        assert_eq!(outcome, FormOutcome::Existing { id: existing });
    }

    #[tokio::test]
    async fn test_lookup_uses_sanitized_name() {
        let mut store = MockCatalogStore::new();
        store
            .expect_find_genre_by_name()
            .withf(|name| name == "Sword &amp; Sorcery")
            .returning(|_| Ok(None));
        store
            .expect_create_genre()
            .withf(|genre| genre.name == "Sword &amp; Sorcery")
            .returning(|_| Ok(Uuid::nil()));

        let service = GenresService::new(Arc::new(store));
        let outcome = service
            .create(&FormPayload::new().with("name", "Sword & Sorcery"))
            .await
            .unwrap();
        assert_eq!(outcome.id(), Some(Uuid::nil()));
    }

    #[tokio::test]
    async fn test_rejected_name_does_not_touch_store() {
        let mut store = MockCatalogStore::new();
        store.expect_find_genre_by_name().never();
        store.expect_create_genre().never();

        let service = GenresService::new(Arc::new(store));
        match service.create(&FormPayload::new().with("name", "SF")).await.unwrap() {
            FormOutcome::Rejected(rejection) => {
                assert_eq!(rejection.errors[0].field, "name");
                assert_eq!(rejection.form.draft.name, "SF");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
