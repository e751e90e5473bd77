//! Error types for malaria-types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing values into domain types.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The text is not one of the known diagnosis values.
    #[error("Unknown diagnosis: {0}")]
    UnknownDiagnosis(String),

    /// The text is not one of the known language codes.
    #[error("Unknown language: {0} (expected 'en' or 'ru')")]
    UnknownLanguage(String),
}

/// Result type alias using malaria-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Reasons an image file cannot be submitted for analysis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageError {
    /// The file does not exist.
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but has no content.
    #[error("File is empty: {}", .0.display())]
    Empty(PathBuf),

    /// The extension is not an accepted image format.
    #[error("Unsupported file format '{0}'. Use JPG, PNG or BMP")]
    UnsupportedFormat(String),

    /// The file metadata could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
