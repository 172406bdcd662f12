//! Part model
//!
//! A part ("chương") is one chapter of a story, identified by its 1-based
//! position within that story. Positions are contiguous with no gaps; only
//! the highest-position part may ever be removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chapter of a story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Unique identifier
    pub id: i64,
    /// Owning story
    pub story_id: i64,
    /// 1-based position within the story
    pub position: i64,
    /// Chapter text
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
