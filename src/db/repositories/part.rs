//! Part repository
//!
//! Database operations for story parts (chapters). Positions are 1-based and
//! contiguous; appending computes `MAX(position) + 1` inside a transaction,
//! and only the highest-position part is ever deleted.

use crate::models::Part;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Part repository trait
#[async_trait]
pub trait PartRepository: Send + Sync {
    /// Append a part at position `MAX(position) + 1`. The story must exist
    /// (enforced by a foreign key; the service checks first for a clean
    /// not-found error).
    async fn append(&self, story_id: i64, content: &str) -> Result<Part>;

    /// Delete the part with the highest position. Returns the removed
    /// position, or `None` when the story has no parts.
    async fn remove_last(&self, story_id: i64) -> Result<Option<i64>>;

    /// Get a part by its position within a story
    async fn get_by_position(&self, story_id: i64, position: i64) -> Result<Option<Part>>;

    /// All parts of a story ordered by position
    async fn list_for_story(&self, story_id: i64) -> Result<Vec<Part>>;

    /// Part #1 of a story, used for excerpts
    async fn first_part(&self, story_id: i64) -> Result<Option<Part>>;

    /// Number of parts a story currently has
    async fn count_for_story(&self, story_id: i64) -> Result<i64>;

    /// Replace the content of an existing part. Returns whether a row
    /// was updated.
    async fn update_content(&self, story_id: i64, position: i64, content: &str) -> Result<bool>;
}

/// SQLx-based part repository implementation
pub struct SqlxPartRepository {
    pool: SqlitePool,
}

impl SqlxPartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PartRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PartRepository for SqlxPartRepository {
    async fn append(&self, story_id: i64, content: &str) -> Result<Part> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT COALESCE(MAX(position), 0) AS max_position FROM parts WHERE story_id = ?")
            .bind(story_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to determine next part position")?;
        let position: i64 = row.get::<i64, _>("max_position") + 1;

        let result = sqlx::query(
            "INSERT INTO parts (story_id, position, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(story_id)
        .bind(position)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to append part")?;

        tx.commit().await.context("Failed to commit part append")?;

        Ok(Part {
            id: result.last_insert_rowid(),
            story_id,
            position,
            content: content.to_string(),
            created_at: now,
        })
    }

    async fn remove_last(&self, story_id: i64) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT MAX(position) AS max_position FROM parts WHERE story_id = ?")
            .bind(story_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to find last part")?;
        let max_position: Option<i64> = row.get("max_position");

        let Some(position) = max_position else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM parts WHERE story_id = ? AND position = ?")
            .bind(story_id)
            .bind(position)
            .execute(&mut *tx)
            .await
            .context("Failed to delete last part")?;

        tx.commit().await.context("Failed to commit part removal")?;
        Ok(Some(position))
    }

    async fn get_by_position(&self, story_id: i64, position: i64) -> Result<Option<Part>> {
        let row = sqlx::query(
            "SELECT id, story_id, position, content, created_at FROM parts WHERE story_id = ? AND position = ?",
        )
        .bind(story_id)
        .bind(position)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get part")?;

        Ok(row.map(|row| row_to_part(&row)))
    }

    async fn list_for_story(&self, story_id: i64) -> Result<Vec<Part>> {
        let rows = sqlx::query(
            "SELECT id, story_id, position, content, created_at FROM parts WHERE story_id = ? ORDER BY position",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list parts")?;

        Ok(rows.iter().map(row_to_part).collect())
    }

    async fn first_part(&self, story_id: i64) -> Result<Option<Part>> {
        self.get_by_position(story_id, 1).await
    }

    async fn count_for_story(&self, story_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM parts WHERE story_id = ?")
            .bind(story_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count parts")?;
        Ok(row.get("count"))
    }

    async fn update_content(&self, story_id: i64, position: i64, content: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE parts SET content = ? WHERE story_id = ? AND position = ?")
                .bind(content)
                .bind(story_id)
                .bind(position)
                .execute(&self.pool)
                .await
                .context("Failed to update part content")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_part(row: &sqlx::sqlite::SqliteRow) -> Part {
    Part {
        id: row.get("id"),
        story_id: row.get("story_id"),
        position: row.get("position"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}
