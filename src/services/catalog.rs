//! Catalog landing page summary

use std::sync::Arc;

use serde::Serialize;

use crate::{error::AppResult, models::BookInstanceStatus, repository::CatalogStore};

/// A count that could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountFailure {
    pub count: &'static str,
    pub message: String,
}

/// Record counts for the landing page. A failed count is `None` and listed
/// in `failures`; the others are still filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub book_count: Option<i64>,
    pub book_instance_count: Option<i64>,
    pub book_instance_available_count: Option<i64>,
    pub author_count: Option<i64>,
    pub genre_count: Option<i64>,
    pub failures: Vec<CountFailure>,
}

impl CatalogSummary {
    fn record(&mut self, count: &'static str, result: AppResult<i64>) -> Option<i64> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to compute {}: {}", count, e);
                self.failures.push(CountFailure {
                    count,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All five counts, queried concurrently
    pub async fn summary(&self) -> CatalogSummary {
        let (books, instances, available, authors, genres) = tokio::join!(
            self.store.count_books(),
            self.store.count_book_instances(None),
            self.store
                .count_book_instances(Some(BookInstanceStatus::Available)),
            self.store.count_authors(),
            self.store.count_genres(),
        );

        let mut summary = CatalogSummary::default();
        summary.book_count = summary.record("book_count", books);
        summary.book_instance_count = summary.record("book_instance_count", instances);
        summary.book_instance_available_count =
            summary.record("book_instance_available_count", available);
        summary.author_count = summary.record("author_count", authors);
        summary.genre_count = summary.record("genre_count", genres);
        summary
    }
}
