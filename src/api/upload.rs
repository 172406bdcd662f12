//! Upload and editing handlers
//!
//! All mutating routes take the write secret as a `secret` form field and
//! check it through the [`WriteGuard`] before touching the services. There
//! are no sessions; every request carries the secret again.
//!
//! Successful mutations redirect (303) to the affected page. Validation
//! failures on the create form re-render it with the submitted values so
//! the author does not lose their text.

use axum::{
    extract::{Path, Query, RawForm, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::common::FormData;
use crate::api::error::PageError;
use crate::api::AppState;
use crate::db::repositories::KeywordScope;
use crate::models::{CreateStoryInput, ListParams, StoryLength, UpdateStoryInput};
use crate::services::{StoryServiceError, WriteToken};

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub scope: Option<String>,
    pub page: Option<u32>,
}

/// GET /upload - submission form plus the management story list.
///
/// The list includes hidden stories; with `?q=` it becomes a keyword search,
/// over title/author by default or over part content with `?scope=content`.
pub async fn new_form(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, PageError> {
    let scope = match query.scope.as_deref() {
        Some("content") => KeywordScope::Content,
        _ => KeywordScope::TitleAuthor,
    };
    let params = ListParams::new(query.page.unwrap_or(1), state.listing.admin_per_page);
    let stories = state
        .catalog
        .admin_list(query.q.as_deref(), scope, &params)
        .await?;

    let mut context = TeraContext::new();
    context.insert("genres", &state.genres.list_genres().await?);
    context.insert("stories", &stories);
    context.insert("q", query.q.as_deref().unwrap_or(""));
    context.insert(
        "scope",
        if scope == KeywordScope::Content { "content" } else { "title" },
    );
    Ok(Html(state.views.render("upload_new.html", &context)?))
}

/// POST /upload - create a story with its first part
pub async fn create_story(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Response, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let input = CreateStoryInput {
        title: form.get("title").unwrap_or_default().to_string(),
        author: form.get("author").unwrap_or_default().to_string(),
        length: parse_length(form.get("length"))?,
        genre_ids: form.get_ids("genre_ids"),
        first_part_content: form.get("content").unwrap_or_default().to_string(),
        is_completed: form.is_checked("is_completed"),
    };

    match state.stories.create_story(&token, input.clone()).await {
        Ok(story) => Ok(Redirect::to(&format!("/upload/{}", story.id)).into_response()),
        Err(StoryServiceError::Validation(message)) => {
            // Re-render the form with what was typed so nothing is lost
            let mut context = TeraContext::new();
            context.insert("error", &message);
            context.insert("genres", &state.genres.list_genres().await?);
            context.insert(
                "form",
                &serde_json::json!({
                    "title": input.title,
                    "author": input.author,
                    "length": input.length,
                    "content": input.first_part_content,
                }),
            );
            let html = state.views.render("upload_new.html", &context)?;
            Ok((axum::http::StatusCode::BAD_REQUEST, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /upload/{id} - edit form for one story
pub async fn edit_form(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let story = state.stories.get_story(story_id).await?;
    let parts = state.stories.list_parts(story_id).await?;
    let story_genres = state.stories.story_genres(story_id).await?;
    let genres = state.genres.list_genres().await?;

    let mut context = TeraContext::new();
    context.insert("story", &story);
    context.insert("parts", &parts);
    context.insert("story_genres", &story_genres);
    context.insert("genres", &genres);

    Ok(Html(state.views.render("upload_edit.html", &context)?))
}

/// POST /story/{id}/update - edit metadata and the genre set
pub async fn update_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let input = UpdateStoryInput {
        title: form.get("title").map(str::to_string),
        author: form.get("author").map(str::to_string),
        length: match form.get("length") {
            Some(raw) => Some(parse_length(Some(raw))?),
            None => None,
        },
        // The form always posts the full checkbox set, so absence means
        // the story now has no genres
        genre_ids: Some(form.get_ids("genre_ids")),
        is_completed: Some(form.is_checked("is_completed")),
    };

    state.stories.update_story(&token, story_id, input).await?;
    Ok(Redirect::to(&format!("/upload/{}", story_id)))
}

/// POST /story/{id}/parts - append a part at the next position
pub async fn append_part(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let content = form.get("content").unwrap_or_default();
    state.stories.append_part(&token, story_id, content).await?;
    Ok(Redirect::to(&format!("/upload/{}", story_id)))
}

/// POST /story/{id}/parts/remove-last - drop the highest-numbered part
pub async fn remove_last_part(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    state.stories.remove_last_part(&token, story_id).await?;
    Ok(Redirect::to(&format!("/upload/{}", story_id)))
}

/// POST /story/{id}/parts/{position} - replace one part's content
pub async fn update_part(
    State(state): State<AppState>,
    Path((story_id, position)): Path<(i64, i64)>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let content = form.get("content").unwrap_or_default();
    state
        .stories
        .update_part(&token, story_id, position, content)
        .await?;
    Ok(Redirect::to(&format!("/upload/{}", story_id)))
}

/// POST /story/{id}/toggle-hidden - flip reader visibility
pub async fn toggle_hidden(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    state.stories.toggle_hidden(&token, story_id).await?;
    Ok(Redirect::to(&format!("/upload/{}", story_id)))
}

/// POST /story/{id}/delete - remove the story and everything under it
pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    state.stories.delete_story(&token, story_id).await?;
    Ok(Redirect::to("/"))
}

/// Check the `secret` field against the configured write secret.
pub(crate) fn authorize(state: &AppState, form: &FormData) -> Result<WriteToken, PageError> {
    let secret = form.get("secret").unwrap_or_default();
    Ok(state.guard.authorize(secret)?)
}

fn parse_length(raw: Option<&str>) -> Result<StoryLength, PageError> {
    let raw = raw.unwrap_or("short");
    StoryLength::from_str(raw)
        .ok_or_else(|| PageError::Validation(format!("Unknown story length '{}'", raw)))
}
