//! Story service
//!
//! Implements business logic for story management:
//! - Create, read, update, delete stories
//! - Part (chapter) appending, removal, and in-place editing
//! - View counting and reader ratings
//! - Validation and author-name normalization
//!
//! Normalization policy: a blank author submitted on create or update is
//! stored as "Ẩn danh" (anonymous). Unknown genre ids are silently dropped
//! rather than rejected; the stored genre set is the intersection of the
//! requested ids with existing genres.

use crate::db::repositories::{GenreRepository, PartRepository, StoryRepository};
use crate::models::{CreateStoryInput, Part, Story, UpdateStoryInput, ANONYMOUS_AUTHOR};
use crate::services::guard::WriteToken;
use std::sync::Arc;

/// Error types for story service operations
#[derive(Debug, thiserror::Error)]
pub enum StoryServiceError {
    /// Story or part not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or empty required field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation would violate an invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Story service for managing stories and their parts
pub struct StoryService {
    stories: Arc<dyn StoryRepository>,
    parts: Arc<dyn PartRepository>,
    genres: Arc<dyn GenreRepository>,
}

impl StoryService {
    /// Create a new story service
    pub fn new(
        stories: Arc<dyn StoryRepository>,
        parts: Arc<dyn PartRepository>,
        genres: Arc<dyn GenreRepository>,
    ) -> Self {
        Self {
            stories,
            parts,
            genres,
        }
    }

    /// Create a new story together with its first part.
    ///
    /// # Errors
    /// - `Validation` if the title or first part content is empty
    pub async fn create_story(
        &self,
        _token: &WriteToken,
        input: CreateStoryInput,
    ) -> Result<Story, StoryServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(StoryServiceError::Validation(
                "Title must not be empty".to_string(),
            ));
        }

        let content = input.first_part_content.trim();
        if content.is_empty() {
            return Err(StoryServiceError::Validation(
                "First part content must not be empty".to_string(),
            ));
        }

        // Unknown genre ids are dropped, not rejected
        let genre_ids = self.genres.filter_existing(&input.genre_ids).await?;

        let normalized = CreateStoryInput {
            title,
            author: normalize_author(&input.author),
            length: input.length,
            genre_ids,
            first_part_content: content.to_string(),
            is_completed: input.is_completed,
        };

        let story = self.stories.create(&normalized).await?;
        tracing::info!(story_id = story.id, title = %story.title, "Story created");
        Ok(story)
    }

    /// Apply a partial update to a story's metadata and genre set.
    ///
    /// # Errors
    /// - `NotFound` if the story does not exist
    /// - `Validation` if a provided title is empty
    pub async fn update_story(
        &self,
        _token: &WriteToken,
        story_id: i64,
        mut input: UpdateStoryInput,
    ) -> Result<Story, StoryServiceError> {
        if let Some(ref title) = input.title {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(StoryServiceError::Validation(
                    "Title must not be empty".to_string(),
                ));
            }
            input.title = Some(trimmed.to_string());
        }

        if let Some(ref author) = input.author {
            input.author = Some(normalize_author(author));
        }

        if let Some(ref genre_ids) = input.genre_ids {
            input.genre_ids = Some(self.genres.filter_existing(genre_ids).await?);
        }

        if !input.has_changes() {
            return self.get_story(story_id).await;
        }

        match self.stories.update(story_id, &input).await? {
            Some(story) => {
                tracing::info!(story_id, "Story updated");
                Ok(story)
            }
            None => Err(StoryServiceError::NotFound(format!(
                "Story {} does not exist",
                story_id
            ))),
        }
    }

    /// Append a new part at the next position.
    ///
    /// # Errors
    /// - `Validation` on empty content
    /// - `NotFound` on unknown story
    pub async fn append_part(
        &self,
        _token: &WriteToken,
        story_id: i64,
        content: &str,
    ) -> Result<Part, StoryServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoryServiceError::Validation(
                "Part content must not be empty".to_string(),
            ));
        }

        self.require_story(story_id).await?;

        let part = self.parts.append(story_id, content).await?;
        tracing::info!(story_id, position = part.position, "Part appended");
        Ok(part)
    }

    /// Remove the part with the highest position.
    ///
    /// A story must always keep at least one part, so removing from a
    /// single-part story fails with `Conflict` and changes nothing.
    pub async fn remove_last_part(
        &self,
        _token: &WriteToken,
        story_id: i64,
    ) -> Result<i64, StoryServiceError> {
        self.require_story(story_id).await?;

        let count = self.parts.count_for_story(story_id).await?;
        if count <= 1 {
            return Err(StoryServiceError::Conflict(
                "A story must keep at least one part".to_string(),
            ));
        }

        let position = self
            .parts
            .remove_last(story_id)
            .await?
            .ok_or_else(|| StoryServiceError::NotFound("Story has no parts".to_string()))?;
        tracing::info!(story_id, position, "Last part removed");
        Ok(position)
    }

    /// Replace the content of an existing part in place.
    pub async fn update_part(
        &self,
        _token: &WriteToken,
        story_id: i64,
        position: i64,
        content: &str,
    ) -> Result<(), StoryServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoryServiceError::Validation(
                "Part content must not be empty".to_string(),
            ));
        }

        let updated = self.parts.update_content(story_id, position, content).await?;
        if !updated {
            return Err(StoryServiceError::NotFound(format!(
                "Part {} of story {} does not exist",
                position, story_id
            )));
        }
        Ok(())
    }

    /// Get a story by id
    pub async fn get_story(&self, story_id: i64) -> Result<Story, StoryServiceError> {
        self.require_story(story_id).await
    }

    /// Get a part by its 1-based position.
    ///
    /// # Errors
    /// - `NotFound` when the story is unknown or the position is outside
    ///   `[1, max]`
    pub async fn get_part(&self, story_id: i64, position: i64) -> Result<Part, StoryServiceError> {
        self.require_story(story_id).await?;
        self.parts
            .get_by_position(story_id, position)
            .await?
            .ok_or_else(|| {
                StoryServiceError::NotFound(format!(
                    "Part {} of story {} does not exist",
                    position, story_id
                ))
            })
    }

    /// All parts of a story ordered by position
    pub async fn list_parts(&self, story_id: i64) -> Result<Vec<Part>, StoryServiceError> {
        self.require_story(story_id).await?;
        Ok(self.parts.list_for_story(story_id).await?)
    }

    /// Genres linked to a story, ordered by name
    pub async fn story_genres(
        &self,
        story_id: i64,
    ) -> Result<Vec<crate::models::Genre>, StoryServiceError> {
        Ok(self.genres.genres_for_story(story_id).await?)
    }

    /// Record one detail-page view. Every call increments by exactly one;
    /// the increment happens at the storage layer so concurrent reads never
    /// lose updates.
    pub async fn record_view(&self, story_id: i64) -> Result<(), StoryServiceError> {
        if !self.stories.increment_views(story_id).await? {
            return Err(StoryServiceError::NotFound(format!(
                "Story {} does not exist",
                story_id
            )));
        }
        Ok(())
    }

    /// Record a reader rating between 1 and 5.
    pub async fn rate_story(&self, story_id: i64, rating: i64) -> Result<(), StoryServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(StoryServiceError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if !self.stories.add_rating(story_id, rating).await? {
            return Err(StoryServiceError::NotFound(format!(
                "Story {} does not exist",
                story_id
            )));
        }
        Ok(())
    }

    /// Flip the hidden flag; returns the new state.
    pub async fn toggle_hidden(
        &self,
        _token: &WriteToken,
        story_id: i64,
    ) -> Result<bool, StoryServiceError> {
        let story = self.require_story(story_id).await?;
        let hidden = !story.is_hidden;
        self.stories.set_hidden(story_id, hidden).await?;
        tracing::info!(story_id, hidden, "Story visibility toggled");
        Ok(hidden)
    }

    /// Delete a story together with its parts and genre links.
    pub async fn delete_story(
        &self,
        _token: &WriteToken,
        story_id: i64,
    ) -> Result<(), StoryServiceError> {
        if !self.stories.delete(story_id).await? {
            return Err(StoryServiceError::NotFound(format!(
                "Story {} does not exist",
                story_id
            )));
        }
        tracing::info!(story_id, "Story deleted");
        Ok(())
    }

    async fn require_story(&self, story_id: i64) -> Result<Story, StoryServiceError> {
        self.stories.get_by_id(story_id).await?.ok_or_else(|| {
            StoryServiceError::NotFound(format!("Story {} does not exist", story_id))
        })
    }
}

/// Blank author names become the anonymous pseudonym.
fn normalize_author(author: &str) -> String {
    let trimmed = author.trim();
    if trimmed.is_empty() {
        ANONYMOUS_AUTHOR.to_string()
    } else {
        trimmed.to_string()
    }
}
