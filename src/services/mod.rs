//! Service layer
//!
//! Business logic between the HTTP handlers and the repositories. Mutating
//! operations require a [`guard::WriteToken`], which only the shared-secret
//! check in [`guard::WriteGuard`] can produce.

pub mod catalog;
pub mod genre;
pub mod guard;
pub mod story;

pub use catalog::{CatalogService, StoryListFilter};
pub use genre::{GenreService, GenreServiceError};
pub use guard::{AuthError, WriteGuard, WriteToken};
pub use story::{StoryService, StoryServiceError};
