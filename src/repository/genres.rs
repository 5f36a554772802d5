//! Genres repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::Removal;
use crate::{
    error::AppResult,
    models::{Genre, NewGenre},
};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all genres sorted by name
    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get genre by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    /// Exact, case-sensitive name lookup
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres WHERE name = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(genre)
    }

    pub async fn create(&self, genre: &NewGenre) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar("INSERT INTO genres (name) VALUES ($1) RETURNING id")
            .bind(&genre.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, genre: &NewGenre) -> AppResult<bool> {
        let result = sqlx::query("UPDATE genres SET name = $1 WHERE id = $2")
            .bind(&genre.name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a genre unless a book still carries it.
    ///
    /// Book writes take `FOR KEY SHARE` on the genres they reference, so the
    /// row lock here serializes against them.
    pub async fn delete(&self, id: Uuid) -> AppResult<Removal> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM genres WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(Removal::Missing);
        }

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE $1 = ANY(genre_ids))")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if referenced {
            tx.rollback().await?;
            return Ok(Removal::Referenced);
        }

        sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Removal::Removed)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
