//! Story model
//!
//! This module provides:
//! - `Story` entity representing a serialized story ("truyện")
//! - `StoryLength` enum for the short/long category
//! - Input types for creating and updating stories
//! - `StorySummary` for list views
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Genre;

/// Author shown for stories submitted without an author name ("Anonymous").
pub const ANONYMOUS_AUTHOR: &str = "Ẩn danh";

/// Story entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier
    pub id: i64,
    /// Story title
    pub title: String,
    /// Author display name, never blank (defaults to [`ANONYMOUS_AUTHOR`])
    pub author: String,
    /// Short/long category
    pub length: StoryLength,
    /// Cumulative view count, only ever increases
    #[serde(default)]
    pub views: i64,
    /// Hidden stories are excluded from all reader-facing listings
    #[serde(default)]
    pub is_hidden: bool,
    /// Whether the story is finished (no further parts expected)
    #[serde(default)]
    pub is_completed: bool,
    /// Sum of all reader ratings (each 1..=5)
    #[serde(default)]
    pub rating_sum: i64,
    /// Number of reader ratings received
    #[serde(default)]
    pub rating_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// Average rating, if the story has been rated at all.
    pub fn rating_average(&self) -> Option<f64> {
        if self.rating_count > 0 {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        } else {
            None
        }
    }
}

/// Short/long story category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    /// A short story, typically a single part
    Short,
    /// A long serialized story with many chapters
    Long,
}

impl Default for StoryLength {
    fn default() -> Self {
        Self::Short
    }
}

impl StoryLength {
    /// Convert to the database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryLength::Short => "short",
            StoryLength::Long => "long",
        }
    }

    /// Parse from the database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "short" => Some(StoryLength::Short),
            "long" => Some(StoryLength::Long),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new story together with its first part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStoryInput {
    /// Story title (required, non-empty)
    pub title: String,
    /// Author name; blank is normalized to [`ANONYMOUS_AUTHOR`]
    #[serde(default)]
    pub author: String,
    /// Short/long category
    #[serde(default)]
    pub length: StoryLength,
    /// Genre ids to assign; unknown ids are silently dropped
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    /// Content of part 1 (required, non-empty)
    pub first_part_content: String,
    /// Whether the story is already complete
    #[serde(default)]
    pub is_completed: bool,
}

/// Input for partially updating an existing story.
///
/// `genre_ids` replaces the whole genre set when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStoryInput {
    /// New title (optional)
    pub title: Option<String>,
    /// New author name (optional; blank normalizes to anonymous)
    pub author: Option<String>,
    /// New length category (optional)
    pub length: Option<StoryLength>,
    /// Replacement genre set (optional)
    pub genre_ids: Option<Vec<i64>>,
    /// New completion flag (optional)
    pub is_completed: Option<bool>,
}

impl UpdateStoryInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.author.is_some()
            || self.length.is_some()
            || self.genre_ids.is_some()
            || self.is_completed.is_some()
    }
}

/// Story summary for list, search and trending views
#[derive(Debug, Clone, Serialize)]
pub struct StorySummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub length: StoryLength,
    pub views: i64,
    pub is_completed: bool,
    /// First characters of part 1, cut at a character boundary
    pub excerpt: String,
    /// Genres assigned to the story, ordered by name
    pub genres: Vec<Genre>,
    /// Number of parts the story currently has
    pub part_count: i64,
    /// Average rating if rated, rounded for display by the template
    pub rating_average: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping to sane bounds
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

// Serialized by hand so templates see the derived pager fields too.
impl<T: Serialize> Serialize for PagedResult<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PagedResult", 7)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("total_pages", &self.total_pages())?;
        state.serialize_field("has_next", &self.has_next())?;
        state.serialize_field("has_prev", &self.has_prev())?;
        state.end()
    }
}
