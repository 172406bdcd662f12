//! Data models
//!
//! This module contains all data structures used throughout doctruyen.
//! Models represent:
//! - Database entities (Story, Part, Genre)
//! - Input types for create/update operations
//! - List-view summaries and pagination containers

mod genre;
mod part;
mod story;

pub use genre::Genre;
pub use part::Part;
pub use story::{
    CreateStoryInput, ListParams, PagedResult, Story, StoryLength, StorySummary,
    UpdateStoryInput, ANONYMOUS_AUTHOR,
};
