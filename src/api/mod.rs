//! API layer - HTTP handlers and routing
//!
//! Server-rendered pages for the story site:
//! - Home page with listings and highlight lists
//! - Story detail pages with part navigation
//! - Search and filtered listings (genre, length, author)
//! - Upload and editing forms gated by the write secret
//! - Genre management pages

pub mod common;
pub mod error;
pub mod genres;
pub mod pages;
pub mod upload;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::config::ListingConfig;
use crate::services::{CatalogService, GenreService, StoryService, WriteGuard};
use crate::view::ViewEngine;

pub use error::PageError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub stories: Arc<StoryService>,
    pub catalog: Arc<CatalogService>,
    pub genres: Arc<GenreService>,
    pub guard: Arc<WriteGuard>,
    pub views: Arc<ViewEngine>,
    pub listing: ListingConfig,
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/story/{id}", get(pages::story_detail))
        .route("/story/{id}/rate", post(pages::rate_story))
        .route("/search", get(pages::search))
        .route("/genre/{id}", get(pages::by_genre))
        .route("/type/{length}", get(pages::by_length))
        .route("/author/{name}", get(pages::by_author))
        .route("/upload", get(upload::new_form).post(upload::create_story))
        .route("/upload/{id}", get(upload::edit_form))
        .route("/story/{id}/update", post(upload::update_story))
        .route("/story/{id}/parts", post(upload::append_part))
        .route("/story/{id}/parts/remove-last", post(upload::remove_last_part))
        .route("/story/{id}/parts/{position}", post(upload::update_part))
        .route("/story/{id}/toggle-hidden", post(upload::toggle_hidden))
        .route("/story/{id}/delete", post(upload::delete_story))
        .route("/genres", get(genres::list).post(genres::create))
        .route("/genres/{id}/update", post(genres::rename))
        .route("/genres/{id}/delete", post(genres::delete))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(middleware::map_response_with_state(
            state.clone(),
            render_not_found_body,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Replace the body of any 404 response with the rendered not-found page,
/// so handlers and the fallback share one template.
async fn render_not_found_body(State(state): State<AppState>, response: Response) -> Response {
    if response.status() != StatusCode::NOT_FOUND {
        return response;
    }
    let html = state.views.render_not_found();
    let mut response = (StatusCode::NOT_FOUND, Html(html)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    response
}

#[cfg(test)]
mod tests;
