//! Database connection pool
//!
//! Creates the SQLite connection pool from configuration. File-based
//! databases get their parent directory created on demand and are opened
//! with create mode so the first start works on an empty data directory.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Create a SQLite connection pool based on configuration.
///
/// Accepts either a bare file path (`data/doctruyen.db`), a full
/// `sqlite:` URL, or `:memory:` for an in-memory database.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = &config.url;
    let in_memory = url == ":memory:" || url.starts_with("sqlite::memory:");

    let options = if in_memory {
        SqliteConnectOptions::new().in_memory(true)
    } else {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        SqliteConnectOptions::new().filename(path).create_if_missing(true)
    };

    // Foreign keys are off by default in SQLite; set per connection so
    // every pooled connection enforces them
    let options = options.foreign_keys(true);

    // An in-memory database is private to its connection, so the pool must
    // hold exactly one
    let max_connections = if in_memory { 1 } else { 20 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    Ok(pool)
}

/// Create an in-memory database pool for testing.
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}
