//! Genre service
//!
//! Manages the genre catalog. Genre names are unique and compared
//! case-sensitively, so "Kiếm hiệp" and "kiếm hiệp" are distinct genres.
//! A genre still linked to stories cannot be deleted.

use crate::db::repositories::GenreRepository;
use crate::models::Genre;
use std::sync::Arc;

use crate::services::guard::WriteToken;

/// Error types for genre service operations
#[derive(Debug, thiserror::Error)]
pub enum GenreServiceError {
    /// Genre not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or empty name
    #[error("Validation error: {0}")]
    Validation(String),

    /// Name already taken, or genre still in use
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Genre service for managing the genre catalog
pub struct GenreService {
    genres: Arc<dyn GenreRepository>,
}

impl GenreService {
    /// Create a new genre service
    pub fn new(genres: Arc<dyn GenreRepository>) -> Self {
        Self { genres }
    }

    /// Create a genre with a unique name.
    ///
    /// # Errors
    /// - `Validation` on a blank name
    /// - `Conflict` when the exact name already exists
    pub async fn create_genre(
        &self,
        _token: &WriteToken,
        name: &str,
    ) -> Result<Genre, GenreServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GenreServiceError::Validation(
                "Genre name must not be empty".to_string(),
            ));
        }

        if self.genres.get_by_name(name).await?.is_some() {
            return Err(GenreServiceError::Conflict(format!(
                "Genre '{}' already exists",
                name
            )));
        }

        let genre = self.genres.create(name).await?;
        tracing::info!(genre_id = genre.id, name = %genre.name, "Genre created");
        Ok(genre)
    }

    /// Rename a genre, keeping names unique.
    pub async fn rename_genre(
        &self,
        _token: &WriteToken,
        genre_id: i64,
        name: &str,
    ) -> Result<Genre, GenreServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GenreServiceError::Validation(
                "Genre name must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.genres.get_by_name(name).await? {
            if existing.id != genre_id {
                return Err(GenreServiceError::Conflict(format!(
                    "Genre '{}' already exists",
                    name
                )));
            }
        }

        if !self.genres.rename(genre_id, name).await? {
            return Err(GenreServiceError::NotFound(format!(
                "Genre {} does not exist",
                genre_id
            )));
        }

        Ok(Genre {
            id: genre_id,
            name: name.to_string(),
        })
    }

    /// Delete a genre that no story links to.
    ///
    /// # Errors
    /// - `Conflict` when at least one story still carries the genre
    pub async fn delete_genre(
        &self,
        _token: &WriteToken,
        genre_id: i64,
    ) -> Result<(), GenreServiceError> {
        let in_use = self.genres.story_count(genre_id).await?;
        if in_use > 0 {
            return Err(GenreServiceError::Conflict(format!(
                "Genre is still linked to {} stories",
                in_use
            )));
        }

        if !self.genres.delete(genre_id).await? {
            return Err(GenreServiceError::NotFound(format!(
                "Genre {} does not exist",
                genre_id
            )));
        }
        tracing::info!(genre_id, "Genre deleted");
        Ok(())
    }

    /// All genres ordered by name
    pub async fn list_genres(&self) -> Result<Vec<Genre>, GenreServiceError> {
        Ok(self.genres.list().await?)
    }

    /// Genre by id
    pub async fn get_genre(&self, genre_id: i64) -> Result<Genre, GenreServiceError> {
        self.genres.get_by_id(genre_id).await?.ok_or_else(|| {
            GenreServiceError::NotFound(format!("Genre {} does not exist", genre_id))
        })
    }
}
