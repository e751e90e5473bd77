//! Error types for malaria-store.

use std::path::PathBuf;

/// Result type for malaria-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in malaria-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No home directory to place the default database in.
    #[error("Could not determine the user's home directory")]
    NoHomeDirectory,

    /// The database was written by a newer version of this program.
    #[error("Unsupported schema version {found} (this build supports up to {supported})")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// Invalid timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
