//! Nhatot-Harvest: an incremental real-estate listing harvester
//!
//! This crate crawls a paginated listing site city by city, fetches the JSON
//! detail document for every discovered ad, flattens it according to a
//! declarative field mapping, and persists the rows idempotently to SQLite.
//! Re-running the harvester never duplicates or corrupts stored ads.

pub mod config;
pub mod crawler;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod schema;
pub mod storage;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, MappingEntry};
pub use normalize::{normalize, CellValue, Row};
pub use schema::{infer_schema, ColumnType, InferredSchema};
pub use storage::AdStore;
