//! Books repository

use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::Removal;
use crate::{
    error::AppResult,
    models::{Book, NewBook},
};

const BOOK_COLUMNS: &str = "id, title, author_id, summary, isbn, genre_ids";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all books in insertion order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY created_at, id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Books written by an author
    pub async fn list_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE author_id = $1 ORDER BY created_at, id",
            BOOK_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Books carrying a genre
    pub async fn list_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE $1 = ANY(genre_ids) ORDER BY created_at, id",
            BOOK_COLUMNS
        ))
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, book: &NewBook) -> AppResult<Uuid> {
        let mut tx = self.pool.begin().await?;
        lock_genres(&mut tx, &book.genre).await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, genre_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.author)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.genre.as_slice())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, book: &NewBook) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        lock_genres(&mut tx, &book.genre).await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, genre_ids = $5
            WHERE id = $6
            "#,
        )
        .bind(&book.title)
        .bind(book.author)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.genre.as_slice())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a book unless copies of it still exist
    pub async fn delete(&self, id: Uuid) -> AppResult<Removal> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(Removal::Missing);
        }

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book_instances WHERE book_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if referenced {
            tx.rollback().await?;
            return Ok(Removal::Referenced);
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Removal::Removed)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Key-share lock the referenced genres so a concurrent genre delete waits
/// for this write and then sees the reference
async fn lock_genres(tx: &mut Transaction<'_, Postgres>, genre_ids: &[Uuid]) -> AppResult<()> {
    if genre_ids.is_empty() {
        return Ok(());
    }
    sqlx::query("SELECT id FROM genres WHERE id = ANY($1) FOR KEY SHARE")
        .bind(genre_ids)
        .fetch_all(&mut **tx)
        .await?;
    Ok(())
}
