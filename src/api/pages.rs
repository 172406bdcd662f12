//! Reader-facing page handlers
//!
//! Every page is rendered server-side. The story detail page counts one
//! view per request before rendering; the `?part=` query selects which
//! part of a multi-part story to show, defaulting to the first.

use axum::{
    extract::{Path, Query, RawForm, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::common::FormData;
use crate::api::error::PageError;
use crate::api::AppState;
use crate::models::{ListParams, StoryLength};
use crate::services::StoryListFilter;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub part: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET / - home page with the newest stories and highlight lists
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let params = ListParams::new(query.page.unwrap_or(1), state.listing.per_page);
    let page = state
        .catalog
        .list_stories(&StoryListFilter::All, &params)
        .await?;

    let mut context = TeraContext::new();
    context.insert("page", &page);
    context.insert("trending", &state.catalog.trending().await?);
    context.insert("best_rated", &state.catalog.best_rated().await?);
    context.insert("recently_updated", &state.catalog.recently_updated().await?);

    Ok(Html(state.views.render("index.html", &context)?))
}

/// GET /story/{id} - story detail, counting one view per request
pub async fn story_detail(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> Result<Html<String>, PageError> {
    let story = state.stories.get_story(story_id).await?;
    if story.is_hidden {
        return Err(PageError::NotFound);
    }

    state.stories.record_view(story_id).await?;

    let position = query.part.unwrap_or(1);
    let part = state.stories.get_part(story_id, position).await?;
    let parts = state.stories.list_parts(story_id).await?;
    let story_genres = state.stories.story_genres(story_id).await?;

    // Re-read after the increment so the displayed count includes this view
    let story = state.stories.get_story(story_id).await?;

    let mut context = TeraContext::new();
    context.insert("story", &story);
    context.insert("part", &part);
    context.insert("part_count", &(parts.len() as i64));
    context.insert("rating_average", &story.rating_average());
    context.insert("genres", &story_genres);

    Ok(Html(state.views.render("story.html", &context)?))
}

/// POST /story/{id}/rate - record a reader rating and bounce back
pub async fn rate_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let rating: i64 = form
        .require("rating")?
        .parse()
        .map_err(|_| PageError::Validation("Rating must be a number".to_string()))?;

    state.stories.rate_story(story_id, rating).await?;
    Ok(Redirect::to(&format!("/story/{}", story_id)))
}

/// GET /search?q= - keyword search over visible stories
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, PageError> {
    let keyword = query.q.unwrap_or_default();
    let results = state.catalog.search_stories(&keyword).await?;

    let mut context = TeraContext::new();
    context.insert("query", keyword.trim());
    context.insert("results", &results);

    Ok(Html(state.views.render("search.html", &context)?))
}

/// GET /genre/{id} - stories in one genre
pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let genre = state.genres.get_genre(genre_id).await?;
    let params = ListParams::new(query.page.unwrap_or(1), state.listing.per_page);
    let page = state
        .catalog
        .list_stories(&StoryListFilter::Genre(genre_id), &params)
        .await?;

    render_list(&state, &format!("Thể loại: {}", genre.name), &page)
}

/// GET /type/{length} - stories of one length class
pub async fn by_length(
    State(state): State<AppState>,
    Path(length): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let length = StoryLength::from_str(&length).ok_or(PageError::NotFound)?;
    let params = ListParams::new(query.page.unwrap_or(1), state.listing.per_page);
    let page = state
        .catalog
        .list_stories(&StoryListFilter::Length(length), &params)
        .await?;

    let heading = match length {
        StoryLength::Short => "Truyện ngắn",
        StoryLength::Long => "Truyện dài",
    };
    render_list(&state, heading, &page)
}

/// GET /author/{name} - stories by one author, exact name match
pub async fn by_author(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let params = ListParams::new(query.page.unwrap_or(1), state.listing.per_page);
    let page = state
        .catalog
        .list_stories(&StoryListFilter::Author(name.clone()), &params)
        .await?;

    render_list(&state, &format!("Tác giả: {}", name), &page)
}

fn render_list(
    state: &AppState,
    heading: &str,
    page: &crate::models::PagedResult<crate::models::StorySummary>,
) -> Result<Html<String>, PageError> {
    let mut context = TeraContext::new();
    context.insert("heading", heading);
    context.insert("page", page);
    Ok(Html(state.views.render("list.html", &context)?))
}
