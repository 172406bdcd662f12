//! Genre repository
//!
//! Database operations for genres and reads of the `story_genres` join
//! table. Writes to the join table happen inside story transactions and
//! live in the story repository.

use crate::models::Genre;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Genre repository trait
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// Insert a genre. The caller checks for duplicates first; the UNIQUE
    /// constraint is the backstop.
    async fn create(&self, name: &str) -> Result<Genre>;

    /// Get genre by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Genre>>;

    /// Get genre by exact (case-sensitive) name
    async fn get_by_name(&self, name: &str) -> Result<Option<Genre>>;

    /// All genres ordered by name
    async fn list(&self) -> Result<Vec<Genre>>;

    /// Keep only the ids that refer to existing genres, preserving order
    /// and dropping duplicates.
    async fn filter_existing(&self, ids: &[i64]) -> Result<Vec<i64>>;

    /// Rename a genre. Returns whether a row was updated.
    async fn rename(&self, id: i64, name: &str) -> Result<bool>;

    /// Delete a genre. Returns whether a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of stories assigned to a genre
    async fn story_count(&self, genre_id: i64) -> Result<i64>;

    /// Genres assigned to a story, ordered by name
    async fn genres_for_story(&self, story_id: i64) -> Result<Vec<Genre>>;
}

/// SQLx-based genre repository implementation
pub struct SqlxGenreRepository {
    pool: SqlitePool,
}

impl SqlxGenreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn GenreRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GenreRepository for SqlxGenreRepository {
    async fn create(&self, name: &str) -> Result<Genre> {
        let result = sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to create genre")?;

        Ok(Genre {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Genre>> {
        let row = sqlx::query("SELECT id, name FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get genre by ID")?;

        Ok(row.map(|row| row_to_genre(&row)))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Genre>> {
        // BINARY-equivalent match: SQLite's = on TEXT is case-sensitive
        let row = sqlx::query("SELECT id, name FROM genres WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get genre by name")?;

        Ok(row.map(|row| row_to_genre(&row)))
    }

    async fn list(&self) -> Result<Vec<Genre>> {
        let rows = sqlx::query("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list genres")?;

        Ok(rows.iter().map(row_to_genre).collect())
    }

    async fn filter_existing(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let mut existing = Vec::new();
        for &id in ids {
            if existing.contains(&id) {
                continue;
            }
            if self.get_by_id(id).await?.is_some() {
                existing.push(id);
            }
        }
        Ok(existing)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE genres SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to rename genre")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM genres WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete genre")?;
        Ok(result.rows_affected() > 0)
    }

    async fn story_count(&self, genre_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM story_genres WHERE genre_id = ?")
            .bind(genre_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count genre usage")?;
        Ok(row.get("count"))
    }

    async fn genres_for_story(&self, story_id: i64) -> Result<Vec<Genre>> {
        let rows = sqlx::query(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN story_genres sg ON sg.genre_id = g.id
            WHERE sg.story_id = ?
            ORDER BY g.name
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load genres for story")?;

        Ok(rows.iter().map(row_to_genre).collect())
    }
}

fn row_to_genre(row: &sqlx::sqlite::SqliteRow) -> Genre {
    Genre {
        id: row.get("id"),
        name: row.get("name"),
    }
}
