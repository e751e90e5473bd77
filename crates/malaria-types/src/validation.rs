//! Checks applied to an image before it is uploaded for analysis.

use std::path::Path;

use crate::error::ImageError;

/// File extensions the classifier accepts (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Returns true if the path has a supported image extension.
///
/// ```
/// use malaria_types::validation::is_supported_format;
///
/// assert!(is_supported_format("photo.JPG".as_ref()));
/// assert!(!is_supported_format("document.pdf".as_ref()));
/// ```
#[must_use]
pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Validate an image file and return its size in bytes.
///
/// # Errors
///
/// Returns [`ImageError`] if the file is missing, empty, or not a
/// supported image format.
pub fn validate_image(path: &Path) -> Result<u64, ImageError> {
    if !path.exists() {
        return Err(ImageError::NotFound(path.to_path_buf()));
    }

    let metadata = std::fs::metadata(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.len() == 0 {
        return Err(ImageError::Empty(path.to_path_buf()));
    }

    if !is_supported_format(path) {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(ImageError::UnsupportedFormat(ext));
    }

    Ok(metadata.len())
}

/// Format a byte count for display (`"2.5 MB"`, `"1.0 KB"`, `"12 B"`).
#[must_use]
pub fn human_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;

    if mb >= 1.0 {
        format!("{:.1} MB", mb)
    } else if kb >= 1.0 {
        format!("{:.1} KB", kb)
    } else {
        format!("{} B", bytes)
    }
}
