//! HTTP client for the malaria inference service.
//!
//! The service classifies one uploaded image at a time and reports its own
//! health. This module only speaks its REST API; validation, health gating
//! and persistence live in [`Analyzer`](crate::Analyzer).
//!
//! # Example
//!
//! ```no_run
//! use malaria_core::InferenceClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InferenceClient::new("http://localhost:8000")?;
//!
//! let health = client.health().await?;
//! if health.is_ready() {
//!     let response = client.analyze("cell_01.png".as_ref()).await?;
//!     println!("{:?}", response.into_prediction());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use malaria_types::{DEFAULT_MODEL, Diagnosis, Prediction, file_name_of};

/// Base URL of a locally running inference service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Request timeout used by [`InferenceClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the inference service API.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
}

/// Error type for inference client operations.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The service is not reachable.
    #[error("Inference service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API returned an error response.
    #[error("API error: {message}")]
    ApiError { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The image could not be read for upload.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for inference client operations.
pub type Result<T> = std::result::Result<T, InferenceError>;

// ==========================================================================
// Response Types
// ==========================================================================

/// Body of `POST /analyze`.
///
/// Every field is optional because the service answers some failures with
/// a bare `{"error": "..."}` and a success status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// `parasitized`, `uninfected` or `error`.
    #[serde(default)]
    pub diagnosis: Option<String>,
    /// Probability that the cell is parasitized.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Inference latency in seconds.
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResponse {
    /// Map the raw response onto a [`Prediction`].
    ///
    /// An `error` field, a missing diagnosis, or a diagnosis outside the
    /// known set all yield a [`Diagnosis::Error`] prediction carrying an
    /// explanatory message.
    pub fn into_prediction(self) -> Prediction {
        let model_used = self
            .model_used
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let processing_time = self.processing_time.unwrap_or(0.0);

        if let Some(message) = self.error {
            let mut prediction = Prediction::failed(message);
            prediction.processing_time = processing_time;
            prediction.model_used = model_used;
            return prediction;
        }

        let Some(raw) = self.diagnosis else {
            return Prediction::failed("Response did not include a diagnosis");
        };

        let diagnosis = Diagnosis::from_service(&raw);
        let mut prediction = Prediction::new(
            diagnosis,
            self.confidence.unwrap_or(0.0),
            processing_time,
            model_used,
        );

        if !diagnosis.is_classified() {
            prediction.error = Some(if raw.trim().eq_ignore_ascii_case("error") {
                "The service could not classify the image".to_string()
            } else {
                format!("Unrecognized diagnosis '{raw}'")
            });
        }

        prediction
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `model_not_loaded`.
    pub status: String,
    #[serde(default)]
    pub service: String,
    /// Compute device the model runs on, e.g. `cpu` or `cuda`.
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub model_loaded: bool,
}

impl HealthResponse {
    /// True when the service reports healthy and has a model loaded.
    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.model_loaded
    }
}

/// Body of `GET /model-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub total_parameters: u64,
    /// Side length in pixels of the square input the model expects.
    pub input_size: u32,
    pub device: String,
}

// ==========================================================================
// InferenceClient Implementation
// ==========================================================================

fn normalize_url(base_url: &str) -> Result<String> {
    // Normalize URL (remove trailing slash)
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    // Validate URL format
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(InferenceError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

impl InferenceClient {
    /// Create a new client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the service (e.g., "http://localhost:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InferenceError::Request)?;

        Ok(Self { client, base_url })
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the service is reachable.
    pub async fn is_reachable(&self) -> bool {
        self.health().await.is_ok()
    }

    /// Check if the service is reachable and has a model loaded.
    pub async fn is_ready(&self) -> bool {
        self.health().await.is_ok_and(|h| h.is_ready())
    }

    /// Get service health.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        self.get(&url).await
    }

    /// Get information about the loaded model.
    pub async fn model_info(&self) -> Result<ModelInfo> {
        let url = format!("{}/model-info", self.base_url);
        let value: serde_json::Value = self.get(&url).await?;

        // Answered with 200 when no model is loaded
        if let Some(message) = error_field(&value) {
            return Err(InferenceError::ApiError {
                status: 200,
                message,
            });
        }

        serde_json::from_value(value).map_err(|source| InferenceError::Decode { url, source })
    }

    /// Upload an image for classification.
    ///
    /// The file is sent as multipart field `image`. The file is not
    /// validated here beyond being readable.
    pub async fn analyze(&self, image: &Path) -> Result<AnalysisResponse> {
        let url = format!("{}/analyze", self.base_url);

        let bytes = tokio::fs::read(image)
            .await
            .map_err(|source| InferenceError::Io {
                path: image.display().to_string(),
                source,
            })?;

        debug!("Uploading {} ({} bytes) to {}", image.display(), bytes.len(), url);

        let part = Part::bytes(bytes)
            .file_name(file_name_of(image))
            .mime_str(mime_type(image))
            .map_err(InferenceError::Request)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::NotReachable {
                url: url.clone(),
                source: e,
            })?;

        self.handle_response(&url, response).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| InferenceError::NotReachable {
                    url: url.to_string(),
                    source: e,
                })?;

        self.handle_response(url, response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(InferenceError::Request)?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        if status.is_success() {
            serde_json::from_str(&body).map_err(|source| InferenceError::Decode {
                url: url.to_string(),
                source,
            })
        } else {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| error_field(&v))
                .unwrap_or_else(|| status.to_string());

            Err(InferenceError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// The service reports errors under `error`; the web framework under `detail`.
fn error_field(value: &serde_json::Value) -> Option<String> {
    value
        .get("error")
        .or_else(|| value.get("detail"))
        .and_then(|e| e.as_str())
        .map(String::from)
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = InferenceClient::new(DEFAULT_SERVICE_URL);
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = InferenceClient::new(" http://localhost:8000/ ").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = InferenceClient::new("localhost:8000");
        assert!(matches!(result, Err(InferenceError::InvalidUrl(_))));
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.png")), "image/png");
        assert_eq!(mime_type(Path::new("a.bmp")), "image/bmp");
        assert_eq!(mime_type(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_successful_response_maps_to_prediction() {
        let json = r#"{
            "diagnosis": "parasitized",
            "confidence": 0.93,
            "processing_time": 0.42,
            "model_used": "EfficientNet-B0"
        }"#;
        let response: AnalysisResponse = serde_json::from_str(json).unwrap();
        let prediction = response.into_prediction();

        assert!(prediction.is_successful());
        assert_eq!(prediction.diagnosis, Diagnosis::Parasitized);
        assert_eq!(prediction.confidence, 0.93);
        assert_eq!(prediction.processing_time, 0.42);
        assert_eq!(prediction.model_used, "EfficientNet-B0");
    }

    #[test]
    fn test_missing_model_defaults() {
        let json = r#"{"diagnosis": "uninfected", "confidence": 0.1, "processing_time": 0.3}"#;
        let prediction = serde_json::from_str::<AnalysisResponse>(json)
            .unwrap()
            .into_prediction();
        assert_eq!(prediction.model_used, DEFAULT_MODEL);
        assert!(prediction.is_successful());
    }

    #[test]
    fn test_error_only_body() {
        let json = r#"{"error": "Empty image file"}"#;
        let prediction = serde_json::from_str::<AnalysisResponse>(json)
            .unwrap()
            .into_prediction();

        assert_eq!(prediction.diagnosis, Diagnosis::Error);
        assert_eq!(prediction.error.as_deref(), Some("Empty image file"));
        assert!(!prediction.is_successful());
    }

    #[test]
    fn test_error_diagnosis_with_message() {
        let json = r#"{"diagnosis": "error", "confidence": 0.0, "error": "Model not loaded"}"#;
        let prediction = serde_json::from_str::<AnalysisResponse>(json)
            .unwrap()
            .into_prediction();

        assert_eq!(prediction.diagnosis, Diagnosis::Error);
        assert_eq!(prediction.error.as_deref(), Some("Model not loaded"));
    }

    #[test]
    fn test_error_diagnosis_without_message() {
        let prediction = AnalysisResponse {
            diagnosis: Some("error".to_string()),
            ..Default::default()
        }
        .into_prediction();
        assert!(prediction.error.is_some());
        assert!(!prediction.is_successful());
    }

    #[test]
    fn test_unknown_diagnosis_is_error() {
        let prediction = AnalysisResponse {
            diagnosis: Some("infected".to_string()),
            confidence: Some(0.7),
            ..Default::default()
        }
        .into_prediction();

        assert_eq!(prediction.diagnosis, Diagnosis::Error);
        assert_eq!(
            prediction.error.as_deref(),
            Some("Unrecognized diagnosis 'infected'")
        );
    }

    #[test]
    fn test_empty_body_has_no_diagnosis() {
        let prediction = serde_json::from_str::<AnalysisResponse>("{}")
            .unwrap()
            .into_prediction();
        assert_eq!(prediction.diagnosis, Diagnosis::Error);
    }

    #[test]
    fn test_health_ready() {
        let json = r#"{"status": "healthy", "service": "malaria-ml-api", "device": "cpu", "model_loaded": true}"#;
        let health: HealthResponse = serde_json::from_str(json).unwrap();
        assert!(health.is_ready());

        let json = r#"{"status": "model_not_loaded", "model_loaded": false}"#;
        let health: HealthResponse = serde_json::from_str(json).unwrap();
        assert!(!health.is_ready());
    }

    #[test]
    fn test_error_field_prefers_error_over_detail() {
        let value = serde_json::json!({"error": "a", "detail": "b"});
        assert_eq!(error_field(&value).as_deref(), Some("a"));

        let value = serde_json::json!({"detail": "Not Found"});
        assert_eq!(error_field(&value).as_deref(), Some("Not Found"));

        let value = serde_json::json!({"detail": [{"msg": "field required"}]});
        assert_eq!(error_field(&value), None);
    }
}
