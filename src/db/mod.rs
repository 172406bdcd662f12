//! Database layer
//!
//! This module provides database access for doctruyen. Storage is SQLite via
//! sqlx, chosen for single-binary deployment: the application creates its own
//! database file on first start and migrates it in place.
//!
//! # Usage
//!
//! ```ignore
//! use doctruyen::config::DatabaseConfig;
//! use doctruyen::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
