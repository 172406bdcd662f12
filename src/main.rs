//! Doctruyen - a small Vietnamese web fiction site

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doctruyen::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxGenreRepository, SqlxPartRepository, SqlxStoryRepository},
    },
    services::{CatalogService, GenreService, StoryService, WriteGuard},
    view::ViewEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doctruyen=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting doctruyen...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let story_repo = SqlxStoryRepository::boxed(pool.clone());
    let part_repo = SqlxPartRepository::boxed(pool.clone());
    let genre_repo = SqlxGenreRepository::boxed(pool.clone());

    // Initialize services
    let stories = Arc::new(StoryService::new(
        story_repo.clone(),
        part_repo.clone(),
        genre_repo.clone(),
    ));
    let catalog = Arc::new(CatalogService::new(
        story_repo,
        part_repo,
        genre_repo.clone(),
    ));
    let genres = Arc::new(GenreService::new(genre_repo));
    let guard = Arc::new(WriteGuard::new(config.upload.secret.clone()));

    // Template engine with embedded templates
    let views = Arc::new(ViewEngine::new()?);
    tracing::info!("View engine initialized");

    let state = AppState {
        stories,
        catalog,
        genres,
        guard,
        views,
        listing: config.listing.clone(),
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
