//! Genre management handlers
//!
//! The genre page doubles as the management surface: listing is public,
//! while create, rename, and delete require the write secret.

use axum::{
    extract::{Path, RawForm, State},
    response::{Html, Redirect},
};
use tera::Context as TeraContext;

use crate::api::common::FormData;
use crate::api::error::PageError;
use crate::api::upload::authorize;
use crate::api::AppState;

/// GET /genres - all genres with management forms
pub async fn list(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let mut context = TeraContext::new();
    context.insert("genres", &state.genres.list_genres().await?);
    Ok(Html(state.views.render("genres.html", &context)?))
}

/// POST /genres - add a genre
pub async fn create(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let name = form.get("name").unwrap_or_default();
    state.genres.create_genre(&token, name).await?;
    Ok(Redirect::to("/genres"))
}

/// POST /genres/{id}/update - rename a genre
pub async fn rename(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    let name = form.get("name").unwrap_or_default();
    state.genres.rename_genre(&token, genre_id, name).await?;
    Ok(Redirect::to("/genres"))
}

/// POST /genres/{id}/delete - remove an unused genre
pub async fn delete(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
    RawForm(body): RawForm,
) -> Result<Redirect, PageError> {
    let form = FormData::parse(&body)?;
    let token = authorize(&state, &form)?;

    state.genres.delete_genre(&token, genre_id).await?;
    Ok(Redirect::to("/genres"))
}
