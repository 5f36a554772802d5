//! Repository layer for catalog persistence.
//!
//! [`CatalogStore`] is the contract the services depend on. [`Repository`]
//! implements it over PostgreSQL; [`memory::MemoryStore`] keeps everything in
//! process.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod memory;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{
        Author, Book, BookInstance, BookInstanceStatus, Genre, NewAuthor, NewBook,
        NewBookInstance, NewGenre,
    },
};

/// Result of a guarded delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// No record with this id
    Missing,
    /// Dependents still reference the record; nothing was removed
    Referenced,
}

/// Persistence operations needed by the catalog services.
///
/// `update_*` replace every mutable field and return `false` when the id does
/// not exist. `delete_*` check dependents and remove in one atomic step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Authors
    async fn list_authors(&self) -> AppResult<Vec<Author>>;
    async fn get_author(&self, id: Uuid) -> AppResult<Option<Author>>;
    async fn create_author(&self, author: &NewAuthor) -> AppResult<Uuid>;
    async fn update_author(&self, id: Uuid, author: &NewAuthor) -> AppResult<bool>;
    async fn delete_author(&self, id: Uuid) -> AppResult<Removal>;
    async fn count_authors(&self) -> AppResult<i64>;

    // Genres
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    async fn get_genre(&self, id: Uuid) -> AppResult<Option<Genre>>;
    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>>;
    async fn create_genre(&self, genre: &NewGenre) -> AppResult<Uuid>;
    async fn update_genre(&self, id: Uuid, genre: &NewGenre) -> AppResult<bool>;
    async fn delete_genre(&self, id: Uuid) -> AppResult<Removal>;
    async fn count_genres(&self) -> AppResult<i64>;

    // Books
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn get_book(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn list_books_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>>;
    async fn list_books_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>>;
    async fn create_book(&self, book: &NewBook) -> AppResult<Uuid>;
    async fn update_book(&self, id: Uuid, book: &NewBook) -> AppResult<bool>;
    async fn delete_book(&self, id: Uuid) -> AppResult<Removal>;
    async fn count_books(&self) -> AppResult<i64>;

    // Book instances
    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>>;
    async fn get_book_instance(&self, id: Uuid) -> AppResult<Option<BookInstance>>;
    async fn list_book_instances_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookInstance>>;
    async fn create_book_instance(&self, instance: &NewBookInstance) -> AppResult<Uuid>;
    async fn update_book_instance(&self, id: Uuid, instance: &NewBookInstance) -> AppResult<bool>;
    async fn delete_book_instance(&self, id: Uuid) -> AppResult<Removal>;
    /// Count copies, restricted to one status when given
    async fn count_book_instances(&self, status: Option<BookInstanceStatus>) -> AppResult<i64>;
}

/// PostgreSQL repository holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub genres: genres::GenresRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a pool from configuration, applying migrations when enabled
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        let repository = Self::new(pool);
        if config.run_migrations {
            repository.migrate().await?;
        }
        Ok(repository)
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogStore for Repository {
    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.authors.list().await
    }

    async fn get_author(&self, id: Uuid) -> AppResult<Option<Author>> {
        self.authors.get_by_id(id).await
    }

    async fn create_author(&self, author: &NewAuthor) -> AppResult<Uuid> {
        self.authors.create(author).await
    }

    async fn update_author(&self, id: Uuid, author: &NewAuthor) -> AppResult<bool> {
        self.authors.update(id, author).await
    }

    async fn delete_author(&self, id: Uuid) -> AppResult<Removal> {
        self.authors.delete(id).await
    }

    async fn count_authors(&self) -> AppResult<i64> {
        self.authors.count().await
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.genres.list().await
    }

    async fn get_genre(&self, id: Uuid) -> AppResult<Option<Genre>> {
        self.genres.get_by_id(id).await
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        self.genres.find_by_name(name).await
    }

    async fn create_genre(&self, genre: &NewGenre) -> AppResult<Uuid> {
        self.genres.create(genre).await
    }

    async fn update_genre(&self, id: Uuid, genre: &NewGenre) -> AppResult<bool> {
        self.genres.update(id, genre).await
    }

    async fn delete_genre(&self, id: Uuid) -> AppResult<Removal> {
        self.genres.delete(id).await
    }

    async fn count_genres(&self) -> AppResult<i64> {
        self.genres.count().await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn get_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.books.get_by_id(id).await
    }

    async fn list_books_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>> {
        self.books.list_by_author(author_id).await
    }

    async fn list_books_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>> {
        self.books.list_by_genre(genre_id).await
    }

    async fn create_book(&self, book: &NewBook) -> AppResult<Uuid> {
        self.books.create(book).await
    }

    async fn update_book(&self, id: Uuid, book: &NewBook) -> AppResult<bool> {
        self.books.update(id, book).await
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<Removal> {
        self.books.delete(id).await
    }

    async fn count_books(&self) -> AppResult<i64> {
        self.books.count().await
    }

    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>> {
        self.book_instances.list().await
    }

    async fn get_book_instance(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        self.book_instances.get_by_id(id).await
    }

    async fn list_book_instances_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookInstance>> {
        self.book_instances.list_by_book(book_id).await
    }

    async fn create_book_instance(&self, instance: &NewBookInstance) -> AppResult<Uuid> {
        self.book_instances.create(instance).await
    }

    async fn update_book_instance(&self, id: Uuid, instance: &NewBookInstance) -> AppResult<bool> {
        self.book_instances.update(id, instance).await
    }

    async fn delete_book_instance(&self, id: Uuid) -> AppResult<Removal> {
        self.book_instances.delete(id).await
    }

    async fn count_book_instances(&self, status: Option<BookInstanceStatus>) -> AppResult<i64> {
        self.book_instances.count(status).await
    }
}
