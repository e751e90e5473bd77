//! Error types for the analysis workflow.

use malaria_types::ImageError;

use crate::inference::InferenceError;

/// Errors that stop an analysis before a diagnosis is available.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image failed local validation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The inference service could not be used.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The service answered its health check but cannot classify yet.
    #[error("Inference service is not ready (status: {status}, model loaded: {model_loaded})")]
    ServiceNotReady { status: String, model_loaded: bool },

    /// The service accepted the upload but reported a failure.
    #[error("Analysis failed: {0}")]
    Rejected(String),
}

/// Result type for the analysis workflow.
pub type Result<T> = std::result::Result<T, Error>;
