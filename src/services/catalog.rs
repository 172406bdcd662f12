//! Catalog service
//!
//! Read-side queries over the story collection: paginated listings with
//! optional genre, length, or author filters, keyword search, and the
//! front-page highlight lists (trending, best rated, recently updated).
//!
//! Listings return [`StorySummary`] values that carry an excerpt of the
//! first part plus genre names and part counts, so templates never reach
//! back into the repositories.

use crate::db::repositories::{
    GenreRepository, KeywordScope, PartRepository, StoryRepository,
};
use crate::models::{ListParams, PagedResult, Story, StoryLength, StorySummary};
use anyhow::Result;
use std::sync::Arc;

/// Maximum number of characters kept in a listing excerpt
pub const EXCERPT_CHARS: usize = 200;

/// Number of entries in the trending list
pub const TRENDING_LIMIT: i64 = 5;

/// Number of entries in the best-rated and recently-updated lists
pub const HIGHLIGHT_LIMIT: i64 = 5;

/// Filter applied to paginated story listings
#[derive(Debug, Clone, PartialEq)]
pub enum StoryListFilter {
    /// All visible stories
    All,
    /// Stories linked to a genre
    Genre(i64),
    /// Stories of a length class
    Length(StoryLength),
    /// Stories by an exact author name
    Author(String),
}

/// Catalog service for browsing and searching stories
pub struct CatalogService {
    stories: Arc<dyn StoryRepository>,
    parts: Arc<dyn PartRepository>,
    genres: Arc<dyn GenreRepository>,
}

impl CatalogService {
    /// Create a new catalog service
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

    /// Paginated listing of visible stories, newest first.
    pub async fn list_stories(
        &self,
        filter: &StoryListFilter,
        params: &ListParams,
    ) -> Result<PagedResult<StorySummary>> {
        let (rows, total) = match filter {
            StoryListFilter::All => (
                self.stories.list_visible(params.offset(), params.limit()).await?,
                self.stories.count_visible().await?,
            ),
            StoryListFilter::Genre(genre_id) => (
                self.stories
                    .list_by_genre(*genre_id, params.offset(), params.limit())
                    .await?,
                self.stories.count_by_genre(*genre_id).await?,
            ),
            StoryListFilter::Length(length) => (
                self.stories
                    .list_by_length(*length, params.offset(), params.limit())
                    .await?,
                self.stories.count_by_length(*length).await?,
            ),
            StoryListFilter::Author(author) => (
                self.stories
                    .list_by_author(author, params.offset(), params.limit())
                    .await?,
                self.stories.count_by_author(author).await?,
            ),
        };

        let summaries = self.summarize(rows).await?;
        Ok(PagedResult::new(summaries, total, params))
    }

    /// Keyword search over visible stories. Matches title, author, and part
    /// content case-insensitively. A blank keyword yields no results rather
    /// than the full collection.
    pub async fn search_stories(&self, keyword: &str) -> Result<Vec<StorySummary>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.stories.search_visible(keyword).await?;
        self.summarize(rows).await
    }

    /// Top stories by view count. Ties break on the lower id so the order
    /// is stable between requests.
    pub async fn trending(&self) -> Result<Vec<Story>> {
        self.stories.trending(TRENDING_LIMIT).await
    }

    /// Highest average rating among stories with at least one rating.
    pub async fn best_rated(&self) -> Result<Vec<Story>> {
        self.stories.best_rated(HIGHLIGHT_LIMIT).await
    }

    /// Stories whose newest part was added most recently.
    pub async fn recently_updated(&self) -> Result<Vec<Story>> {
        self.stories.recently_updated(HIGHLIGHT_LIMIT).await
    }

    /// Admin listing over all stories, hidden ones included. With a keyword
    /// the listing becomes a scoped search.
    pub async fn admin_list(
        &self,
        keyword: Option<&str>,
        scope: KeywordScope,
        params: &ListParams,
    ) -> Result<PagedResult<Story>> {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let (rows, total) = match keyword {
            Some(keyword) => (
                self.stories
                    .search_all(keyword, scope, params.offset(), params.limit())
                    .await?,
                self.stories.count_search_all(keyword, scope).await?,
            ),
            None => (
                self.stories.list_all(params.offset(), params.limit()).await?,
                self.stories.count_all().await?,
            ),
        };
        Ok(PagedResult::new(rows, total, params))
    }

    /// Build listing summaries with excerpt, genres, and part count.
    async fn summarize(&self, rows: Vec<Story>) -> Result<Vec<StorySummary>> {
        let mut summaries = Vec::with_capacity(rows.len());
        for story in rows {
            let excerpt = match self.parts.first_part(story.id).await? {
                Some(part) => make_excerpt(&part.content),
                None => String::new(),
            };
            let genres = self.genres.genres_for_story(story.id).await?;
            let part_count = self.parts.count_for_story(story.id).await?;
            summaries.push(StorySummary {
                id: story.id,
                title: story.title,
                author: story.author,
                length: story.length,
                views: story.views,
                is_completed: story.is_completed,
                excerpt,
                genres,
                part_count,
                rating_average: if story.rating_count > 0 {
                    Some(story.rating_sum as f64 / story.rating_count as f64)
                } else {
                    None
                },
                created_at: story.created_at,
            });
        }
        Ok(summaries)
    }
}

/// First `EXCERPT_CHARS` characters of the content, with an ellipsis when
/// truncated. Counts characters, not bytes, so multi-byte Vietnamese text
/// never splits mid-codepoint.
fn make_excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let excerpt: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", excerpt)
    } else {
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxGenreRepository, SqlxPartRepository, SqlxStoryRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateStoryInput;
    use crate::services::guard::WriteGuard;
    use crate::services::story::StoryService;
    use sqlx::SqlitePool;

    async fn setup() -> (SqlitePool, CatalogService, StoryService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let stories = SqlxStoryRepository::boxed(pool.clone());
        let parts = SqlxPartRepository::boxed(pool.clone());
        let genres = SqlxGenreRepository::boxed(pool.clone());

        let catalog = CatalogService::new(stories.clone(), parts.clone(), genres.clone());
        let story_service = StoryService::new(stories, parts, genres);

        (pool, catalog, story_service)
    }

    async fn seed_story(
        service: &StoryService,
        title: &str,
        author: &str,
        length: StoryLength,
        genre_ids: Vec<i64>,
        content: &str,
    ) -> i64 {
        let token = WriteGuard::new("secret").authorize("secret").unwrap();
        let story = service
            .create_story(
                &token,
                CreateStoryInput {
                    title: title.to_string(),
                    author: author.to_string(),
                    length,
                    genre_ids,
                    first_part_content: content.to_string(),
                    is_completed: false,
                },
            )
            .await
            .unwrap();
        story.id
    }

    async fn insert_genre(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_list_stories_newest_first_with_summaries() {
        let (pool, catalog, stories) = setup().await;

        let genre_id = insert_genre(&pool, "Kiếm hiệp").await;
        seed_story(&stories, "Một", "A", StoryLength::Short, vec![], "Nội dung một").await;
        seed_story(
            &stories,
            "Hai",
            "B",
            StoryLength::Long,
            vec![genre_id],
            "Nội dung hai",
        )
        .await;

        let page = catalog
            .list_stories(&StoryListFilter::All, &ListParams::new(1, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        // Identical timestamps fall back to id DESC, so newest insert leads
        assert_eq!(page.items[0].title, "Hai");
        assert_eq!(page.items[1].title, "Một");
        assert_eq!(page.items[0].genres.len(), 1);
        assert_eq!(page.items[0].genres[0].name, "Kiếm hiệp");
        assert_eq!(page.items[0].part_count, 1);
        assert_eq!(page.items[0].excerpt, "Nội dung hai");
    }

    #[tokio::test]
    async fn test_list_stories_excludes_hidden() {
        let (_pool, catalog, stories) = setup().await;
        let token = WriteGuard::new("secret").authorize("secret").unwrap();

        let visible = seed_story(&stories, "Hiện", "A", StoryLength::Short, vec![], "x").await;
        let hidden = seed_story(&stories, "Ẩn", "A", StoryLength::Short, vec![], "x").await;
        stories.toggle_hidden(&token, hidden).await.unwrap();

        let page = catalog
            .list_stories(&StoryListFilter::All, &ListParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, visible);

        // Admin listing still sees both
        let all = catalog
            .admin_list(None, KeywordScope::TitleAuthor, &ListParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_list_stories_genre_filter_requires_link() {
        let (pool, catalog, stories) = setup().await;

        let g1 = insert_genre(&pool, "Kiếm hiệp").await;
        let g2 = insert_genre(&pool, "Tiên hiệp").await;

        let in_genre = seed_story(&stories, "Trong", "A", StoryLength::Short, vec![g1], "x").await;
        seed_story(&stories, "Ngoài", "A", StoryLength::Short, vec![g2], "x").await;

        let page = catalog
            .list_stories(&StoryListFilter::Genre(g1), &ListParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, in_genre);
    }

    #[tokio::test]
    async fn test_list_stories_length_and_author_filters() {
        let (_pool, catalog, stories) = setup().await;

        seed_story(&stories, "Ngắn", "An", StoryLength::Short, vec![], "x").await;
        seed_story(&stories, "Dài", "Bình", StoryLength::Long, vec![], "x").await;

        let short = catalog
            .list_stories(
                &StoryListFilter::Length(StoryLength::Short),
                &ListParams::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(short.total, 1);
        assert_eq!(short.items[0].title, "Ngắn");

        let by_author = catalog
            .list_stories(
                &StoryListFilter::Author("Bình".to_string()),
                &ListParams::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(by_author.total, 1);
        assert_eq!(by_author.items[0].title, "Dài");
    }

    #[tokio::test]
    async fn test_pagination_boundaries() {
        let (_pool, catalog, stories) = setup().await;

        for n in 1..=5 {
            seed_story(
                &stories,
                &format!("Truyện {}", n),
                "A",
                StoryLength::Short,
                vec![],
                "x",
            )
            .await;
        }

        let page1 = catalog
            .list_stories(&StoryListFilter::All, &ListParams::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1.total, 5);
        assert_eq!(page1.total_pages(), 3);
        assert!(page1.has_next());
        assert!(!page1.has_prev());

        let page3 = catalog
            .list_stories(&StoryListFilter::All, &ListParams::new(3, 2))
            .await
            .unwrap();
        assert_eq!(page3.len(), 1);
        assert!(!page3.has_next());

        // Past the end: empty page, same totals
        let page9 = catalog
            .list_stories(&StoryListFilter::All, &ListParams::new(9, 2))
            .await
            .unwrap();
        assert!(page9.is_empty());
        assert_eq!(page9.total, 5);
    }

    #[tokio::test]
    async fn test_search_blank_keyword_is_empty() {
        let (_pool, catalog, stories) = setup().await;
        seed_story(&stories, "Truyện", "A", StoryLength::Short, vec![], "x").await;

        assert!(catalog.search_stories("").await.unwrap().is_empty());
        assert!(catalog.search_stories("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_title_author_and_content() {
        let (_pool, catalog, stories) = setup().await;

        let by_title =
            seed_story(&stories, "Hành Trình", "A", StoryLength::Short, vec![], "mở đầu").await;
        let by_author =
            seed_story(&stories, "Khác", "Trình Bày", StoryLength::Short, vec![], "mở đầu").await;
        let by_content = seed_story(
            &stories,
            "Thứ ba",
            "B",
            StoryLength::Short,
            vec![],
            "một hành trình dài",
        )
        .await;
        seed_story(&stories, "Không khớp", "C", StoryLength::Short, vec![], "khác hẳn").await;

        // Case-insensitive for ASCII letters
        let hits = catalog.search_stories("TRìNH").await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|s| s.id).collect();
        assert!(ids.contains(&by_title));
        assert!(ids.contains(&by_author));
        assert!(ids.contains(&by_content));
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_search_excludes_hidden() {
        let (_pool, catalog, stories) = setup().await;
        let token = WriteGuard::new("secret").authorize("secret").unwrap();

        let hidden = seed_story(&stories, "Bí mật", "A", StoryLength::Short, vec![], "x").await;
        stories.toggle_hidden(&token, hidden).await.unwrap();

        assert!(catalog.search_stories("Bí mật").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trending_orders_by_views_then_id() {
        let (_pool, catalog, stories) = setup().await;

        let mut ids = Vec::new();
        for n in 1..=7 {
            ids.push(
                seed_story(
                    &stories,
                    &format!("Truyện {}", n),
                    "A",
                    StoryLength::Short,
                    vec![],
                    "x",
                )
                .await,
            );
        }

        // ids[2] gets 5 views, ids[5] gets 3, ids[0] and ids[1] get 3 each
        for _ in 0..5 {
            stories.record_view(ids[2]).await.unwrap();
        }
        for _ in 0..3 {
            stories.record_view(ids[5]).await.unwrap();
            stories.record_view(ids[0]).await.unwrap();
            stories.record_view(ids[1]).await.unwrap();
        }

        let trending = catalog.trending().await.unwrap();
        assert_eq!(trending.len(), 5);
        assert_eq!(trending[0].id, ids[2]);
        // Three-way tie at 3 views resolves by ascending id
        assert_eq!(trending[1].id, ids[0]);
        assert_eq!(trending[2].id, ids[1]);
        assert_eq!(trending[3].id, ids[5]);
        // Remaining slot filled by a zero-view story, lowest id first
        assert_eq!(trending[4].id, ids[3]);
    }

    #[tokio::test]
    async fn test_trending_fewer_than_limit() {
        let (_pool, catalog, stories) = setup().await;
        seed_story(&stories, "Một mình", "A", StoryLength::Short, vec![], "x").await;

        let trending = catalog.trending().await.unwrap();
        assert_eq!(trending.len(), 1);
    }

    #[tokio::test]
    async fn test_best_rated_requires_ratings() {
        let (_pool, catalog, stories) = setup().await;

        let rated_low = seed_story(&stories, "Thấp", "A", StoryLength::Short, vec![], "x").await;
        let rated_high = seed_story(&stories, "Cao", "A", StoryLength::Short, vec![], "x").await;
        seed_story(&stories, "Chưa ai", "A", StoryLength::Short, vec![], "x").await;

        stories.rate_story(rated_low, 2).await.unwrap();
        stories.rate_story(rated_high, 5).await.unwrap();
        stories.rate_story(rated_high, 4).await.unwrap();

        let best = catalog.best_rated().await.unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].id, rated_high);
        assert_eq!(best[1].id, rated_low);
    }

    #[tokio::test]
    async fn test_recently_updated_follows_latest_part() {
        let (pool, catalog, stories) = setup().await;
        let token = WriteGuard::new("secret").authorize("secret").unwrap();

        let older = seed_story(&stories, "Cũ", "A", StoryLength::Short, vec![], "x").await;
        let newer = seed_story(&stories, "Mới", "A", StoryLength::Short, vec![], "x").await;

        // Give the older story a strictly later part timestamp
        sqlx::query(
            "INSERT INTO parts (story_id, position, content, created_at)
             VALUES (?, 2, 'chương 2', '2999-01-01T00:00:00Z')",
        )
        .bind(older)
        .execute(&pool)
        .await
        .unwrap();

        let recent = catalog.recently_updated().await.unwrap();
        assert_eq!(recent[0].id, older);
        assert_eq!(recent[1].id, newer);

        // Hidden stories drop out
        stories.toggle_hidden(&token, older).await.unwrap();
        let recent = catalog.recently_updated().await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, newer);
    }

    #[tokio::test]
    async fn test_admin_list_keyword_scopes() {
        let (_pool, catalog, stories) = setup().await;

        let by_title =
            seed_story(&stories, "Hành Trình", "A", StoryLength::Short, vec![], "mở đầu").await;
        let by_content =
            seed_story(&stories, "Khác", "B", StoryLength::Short, vec![], "hành quân").await;

        let title_hits = catalog
            .admin_list(Some("hành"), KeywordScope::TitleAuthor, &ListParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(title_hits.total, 1);
        assert_eq!(title_hits.items[0].id, by_title);

        let content_hits = catalog
            .admin_list(Some("hành"), KeywordScope::Content, &ListParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(content_hits.total, 1);
        assert_eq!(content_hits.items[0].id, by_content);
    }

    #[test]
    fn test_make_excerpt_char_boundary() {
        let short = "ngắn";
        assert_eq!(make_excerpt(short), "ngắn");

        // 250 multi-byte chars truncate at exactly 200 chars plus ellipsis
        let long: String = std::iter::repeat('ư').take(250).collect();
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1);
        assert!(excerpt.ends_with('…'));

        let exact: String = std::iter::repeat('a').take(EXCERPT_CHARS).collect();
        assert_eq!(make_excerpt(&exact), exact);
    }
}
