//! Story repository
//!
//! Database operations for stories, including the multi-step mutations that
//! must be atomic: creating a story together with its first part and genre
//! links, replacing the genre set on update, and deleting a story with all
//! of its dependent rows.
//!
//! This module provides:
//! - `StoryRepository` trait defining the interface for story data access
//! - `SqlxStoryRepository` implementing the trait over SQLite

use crate::models::{CreateStoryInput, Story, StoryLength, UpdateStoryInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Admin keyword search scope (mirrors the upload page's search modes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordScope {
    /// Match against title or author
    TitleAuthor,
    /// Match against any part's content
    Content,
}

/// Story repository trait
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Create a story with its first part and genre links in one transaction.
    ///
    /// The input is expected to be validated and normalized by the service:
    /// non-empty title/content, resolved author, genre ids filtered to
    /// existing genres.
    async fn create(&self, input: &CreateStoryInput) -> Result<Story>;

    /// Get story by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Story>>;

    /// Apply a partial update; replaces the genre set when one is given.
    /// Returns `None` when the story does not exist.
    async fn update(&self, id: i64, input: &UpdateStoryInput) -> Result<Option<Story>>;

    /// Delete a story with its parts and genre links. Returns whether a row
    /// was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Atomically increment the view counter. Returns false for unknown ids.
    async fn increment_views(&self, id: i64) -> Result<bool>;

    /// Add a reader rating (validated to 1..=5 by the service).
    async fn add_rating(&self, id: i64, rating: i64) -> Result<bool>;

    /// Set the hidden flag. Returns false for unknown ids.
    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<bool>;

    /// List visible stories, newest first
    async fn list_visible(&self, offset: i64, limit: i64) -> Result<Vec<Story>>;
    async fn count_visible(&self) -> Result<i64>;

    /// List visible stories in a genre, newest first
    async fn list_by_genre(&self, genre_id: i64, offset: i64, limit: i64) -> Result<Vec<Story>>;
    async fn count_by_genre(&self, genre_id: i64) -> Result<i64>;

    /// List visible stories of a length category, newest first
    async fn list_by_length(&self, length: StoryLength, offset: i64, limit: i64)
        -> Result<Vec<Story>>;
    async fn count_by_length(&self, length: StoryLength) -> Result<i64>;

    /// List visible stories by an author, newest first
    async fn list_by_author(&self, author: &str, offset: i64, limit: i64) -> Result<Vec<Story>>;
    async fn count_by_author(&self, author: &str) -> Result<i64>;

    /// List every story including hidden ones (management page), newest first
    async fn list_all(&self, offset: i64, limit: i64) -> Result<Vec<Story>>;
    async fn count_all(&self) -> Result<i64>;

    /// Case-insensitive substring search over title, author, or any part's
    /// content, visible stories only, newest first.
    async fn search_visible(&self, keyword: &str) -> Result<Vec<Story>>;

    /// Keyword search for the management page (includes hidden stories)
    async fn search_all(
        &self,
        keyword: &str,
        scope: KeywordScope,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Story>>;
    async fn count_search_all(&self, keyword: &str, scope: KeywordScope) -> Result<i64>;

    /// Top stories by view count; ties broken by ascending id.
    async fn trending(&self, limit: i64) -> Result<Vec<Story>>;

    /// Top stories by average rating among stories with at least one rating;
    /// ties broken by ascending id.
    async fn best_rated(&self, limit: i64) -> Result<Vec<Story>>;

    /// Stories whose most recent part is newest
    async fn recently_updated(&self, limit: i64) -> Result<Vec<Story>>;
}

/// SQLx-based story repository implementation
pub struct SqlxStoryRepository {
    pool: SqlitePool,
}

impl SqlxStoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn StoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const STORY_COLUMNS: &str = "id, title, author, length, views, is_hidden, is_completed, rating_sum, rating_count, created_at";

#[async_trait]
impl StoryRepository for SqlxStoryRepository {
    async fn create(&self, input: &CreateStoryInput) -> Result<Story> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO stories (title, author, length, views, is_hidden, is_completed, rating_sum, rating_count, created_at)
            VALUES (?, ?, ?, 0, 0, ?, 0, 0, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.length.as_str())
        .bind(input.is_completed)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create story")?;

        let id = result.last_insert_rowid();

        sqlx::query("INSERT INTO parts (story_id, position, content, created_at) VALUES (?, 1, ?, ?)")
            .bind(id)
            .bind(&input.first_part_content)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create first part")?;

        for genre_id in &input.genre_ids {
            sqlx::query("INSERT INTO story_genres (story_id, genre_id) VALUES (?, ?)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await
                .context("Failed to link genre")?;
        }

        tx.commit().await.context("Failed to commit story creation")?;

        Ok(Story {
            id,
            title: input.title.clone(),
            author: input.author.clone(),
            length: input.length,
            views: 0,
            is_hidden: false,
            is_completed: input.is_completed,
            rating_sum: 0,
            rating_count: 0,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Story>> {
        let row = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get story by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_story(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i64, input: &UpdateStoryInput) -> Result<Option<Story>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load story for update")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut story = row_to_story(&row)?;

        if let Some(ref title) = input.title {
            story.title = title.clone();
        }
        if let Some(ref author) = input.author {
            story.author = author.clone();
        }
        if let Some(length) = input.length {
            story.length = length;
        }
        if let Some(is_completed) = input.is_completed {
            story.is_completed = is_completed;
        }

        sqlx::query("UPDATE stories SET title = ?, author = ?, length = ?, is_completed = ? WHERE id = ?")
            .bind(&story.title)
            .bind(&story.author)
            .bind(story.length.as_str())
            .bind(story.is_completed)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update story")?;

        // Replace the genre set when one was given
        if let Some(ref genre_ids) = input.genre_ids {
            sqlx::query("DELETE FROM story_genres WHERE story_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear genre links")?;

            for genre_id in genre_ids {
                sqlx::query("INSERT INTO story_genres (story_id, genre_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(genre_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to link genre")?;
            }
        }

        tx.commit().await.context("Failed to commit story update")?;
        Ok(Some(story))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM story_genres WHERE story_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete genre links")?;

        sqlx::query("DELETE FROM parts WHERE story_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete parts")?;

        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete story")?;

        tx.commit().await.context("Failed to commit story deletion")?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        // Single UPDATE so concurrent increments are never lost
        let result = sqlx::query("UPDATE stories SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment views")?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_rating(&self, id: i64, rating: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE stories SET rating_sum = rating_sum + ?, rating_count = rating_count + 1 WHERE id = ?",
        )
        .bind(rating)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to add rating")?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE stories SET is_hidden = ? WHERE id = ?")
            .bind(hidden)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set hidden flag")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_visible(&self, offset: i64, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE is_hidden = 0 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list stories")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_visible(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM stories WHERE is_hidden = 0")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count stories")?;
        Ok(row.get("count"))
    }

    async fn list_by_genre(&self, genre_id: i64, offset: i64, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT s.{STORY_COLUMNS_QUALIFIED}
            FROM stories s
            JOIN story_genres sg ON sg.story_id = s.id
            WHERE sg.genre_id = ? AND s.is_hidden = 0
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ? OFFSET ?
            "#,
            STORY_COLUMNS_QUALIFIED = STORY_COLUMNS.replace(", ", ", s.")
        ))
        .bind(genre_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list stories by genre")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_by_genre(&self, genre_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM stories s
            JOIN story_genres sg ON sg.story_id = s.id
            WHERE sg.genre_id = ? AND s.is_hidden = 0
            "#,
        )
        .bind(genre_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count stories by genre")?;
        Ok(row.get("count"))
    }

    async fn list_by_length(
        &self,
        length: StoryLength,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE length = ? AND is_hidden = 0 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(length.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list stories by length")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_by_length(&self, length: StoryLength) -> Result<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS count FROM stories WHERE length = ? AND is_hidden = 0")
                .bind(length.as_str())
                .fetch_one(&self.pool)
                .await
                .context("Failed to count stories by length")?;
        Ok(row.get("count"))
    }

    async fn list_by_author(&self, author: &str, offset: i64, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE author = ? AND is_hidden = 0 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(author)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list stories by author")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_by_author(&self, author: &str) -> Result<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS count FROM stories WHERE author = ? AND is_hidden = 0")
                .bind(author)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count stories by author")?;
        Ok(row.get("count"))
    }

    async fn list_all(&self, offset: i64, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list all stories")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_all(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM stories")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count all stories")?;
        Ok(row.get("count"))
    }

    async fn search_visible(&self, keyword: &str) -> Result<Vec<Story>> {
        let pattern = like_pattern(keyword);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS} FROM stories s
            WHERE s.is_hidden = 0
              AND (LOWER(s.title) LIKE ?1
                OR LOWER(s.author) LIKE ?1
                OR EXISTS (
                    SELECT 1 FROM parts p
                    WHERE p.story_id = s.id AND LOWER(p.content) LIKE ?1
                ))
            ORDER BY s.created_at DESC, s.id DESC
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search stories")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn search_all(
        &self,
        keyword: &str,
        scope: KeywordScope,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Story>> {
        let pattern = like_pattern(keyword);
        let sql = match scope {
            KeywordScope::TitleAuthor => format!(
                "SELECT {STORY_COLUMNS} FROM stories s
                 WHERE LOWER(s.title) LIKE ?1 OR LOWER(s.author) LIKE ?1
                 ORDER BY s.created_at DESC, s.id DESC LIMIT ?2 OFFSET ?3"
            ),
            KeywordScope::Content => format!(
                "SELECT {STORY_COLUMNS} FROM stories s
                 WHERE EXISTS (
                     SELECT 1 FROM parts p
                     WHERE p.story_id = s.id AND LOWER(p.content) LIKE ?1
                 )
                 ORDER BY s.created_at DESC, s.id DESC LIMIT ?2 OFFSET ?3"
            ),
        };

        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to search stories for management")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn count_search_all(&self, keyword: &str, scope: KeywordScope) -> Result<i64> {
        let pattern = like_pattern(keyword);
        let sql = match scope {
            KeywordScope::TitleAuthor => {
                "SELECT COUNT(*) AS count FROM stories s
                 WHERE LOWER(s.title) LIKE ?1 OR LOWER(s.author) LIKE ?1"
            }
            KeywordScope::Content => {
                "SELECT COUNT(*) AS count FROM stories s
                 WHERE EXISTS (
                     SELECT 1 FROM parts p
                     WHERE p.story_id = s.id AND LOWER(p.content) LIKE ?1
                 )"
            }
        };

        let row = sqlx::query(sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count search results")?;
        Ok(row.get("count"))
    }

    async fn trending(&self, limit: i64) -> Result<Vec<Story>> {
        // Deterministic tie-break: ascending id
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE is_hidden = 0 ORDER BY views DESC, id ASC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query trending stories")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn best_rated(&self, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS} FROM stories
            WHERE is_hidden = 0 AND rating_count > 0
            ORDER BY (rating_sum * 1.0 / rating_count) DESC, id ASC
            LIMIT ?
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query best rated stories")?;

        rows.iter().map(row_to_story).collect()
    }

    async fn recently_updated(&self, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STORY_COLUMNS_QUALIFIED}
            FROM stories s
            JOIN (
                SELECT story_id, MAX(created_at) AS latest_part
                FROM parts
                GROUP BY story_id
            ) recent ON recent.story_id = s.id
            WHERE s.is_hidden = 0
            ORDER BY recent.latest_part DESC, s.id DESC
            LIMIT ?
            "#,
            STORY_COLUMNS_QUALIFIED = format!("s.{}", STORY_COLUMNS.replace(", ", ", s."))
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query recently updated stories")?;

        rows.iter().map(row_to_story).collect()
    }
}

fn like_pattern(keyword: &str) -> String {
    format!("%{}%", keyword.to_lowercase())
}

fn row_to_story(row: &sqlx::sqlite::SqliteRow) -> Result<Story> {
    let length_str: String = row.get("length");
    let length = StoryLength::from_str(&length_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid story length: {}", length_str))?;

    Ok(Story {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        length,
        views: row.try_get("views").unwrap_or(0),
        is_hidden: row.try_get("is_hidden").unwrap_or(false),
        is_completed: row.try_get("is_completed").unwrap_or(false),
        rating_sum: row.try_get("rating_sum").unwrap_or(0),
        rating_count: row.try_get("rating_count").unwrap_or(0),
        created_at: row.get("created_at"),
    })
}
