//! Configuration management
//!
//! This module handles loading and parsing configuration for doctruyen.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. The one option
//! every deployment should set is `upload.secret`, the shared secret that
//! gates all write operations.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload (write-access) configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Listing configuration
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL (`:memory:` for tests)
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/doctruyen.db".to_string()
}

/// Write-access configuration.
///
/// The secret is checked on every mutating request; there is no session
/// state. It is injected into [`crate::services::guard::WriteGuard`] at
/// startup rather than read from ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Shared secret required by all write operations
    #[serde(default = "default_upload_secret")]
    pub secret: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            secret: default_upload_secret(),
        }
    }
}

fn default_upload_secret() -> String {
    // Development default; deployments set DOCTRUYEN_UPLOAD_SECRET
    "secret".to_string()
}

/// Listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Stories per page on reader-facing lists
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Stories per page on the management list
    #[serde(default = "default_admin_per_page")]
    pub admin_per_page: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            admin_per_page: default_admin_per_page(),
        }
    }
}

fn default_per_page() -> u32 {
    10
}

fn default_admin_per_page() -> u32 {
    25
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        // If file doesn't exist, return defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Environment variables follow the pattern:
    /// - DOCTRUYEN_SERVER_HOST
    /// - DOCTRUYEN_SERVER_PORT
    /// - DOCTRUYEN_DATABASE_URL
    /// - DOCTRUYEN_UPLOAD_SECRET
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DOCTRUYEN_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOCTRUYEN_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("DOCTRUYEN_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = std::env::var("DOCTRUYEN_UPLOAD_SECRET") {
            self.upload.secret = secret;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
