//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod genre;
pub mod part;
pub mod story;

pub use genre::{GenreRepository, SqlxGenreRepository};
pub use part::{PartRepository, SqlxPartRepository};
pub use story::{KeywordScope, SqlxStoryRepository, StoryRepository};
