//! Genre model
//!
//! Genres ("thể loại") are independent tag entities with a case-sensitive
//! unique name. They are assigned to stories through the `story_genres`
//! join table and are never deleted as a side effect of story operations.

use serde::{Deserialize, Serialize};

/// Genre entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Unique identifier
    pub id: i64,
    /// Unique genre name (case-sensitive)
    pub name: String,
}
