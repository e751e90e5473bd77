//! Mock classifier for testing.
//!
//! [`MockClassifier`] implements [`Classifier`] without a network, so the
//! analysis workflow can be exercised in unit tests.
//!
//! # Features
//!
//! - **Canned responses**: Set the analysis, health and model-info bodies
//! - **Failure injection**: Make every call fail as if the service were down
//! - **Latency simulation**: Add artificial delays to simulate slow inference

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use malaria_types::{DEFAULT_MODEL, Diagnosis};

use crate::inference::{AnalysisResponse, HealthResponse, InferenceError, ModelInfo, Result};
use crate::traits::Classifier;

/// A mock inference service.
///
/// # Example
///
/// ```
/// use malaria_core::{Classifier, MockClassifier};
/// use malaria_types::Diagnosis;
///
/// #[tokio::main]
/// async fn main() {
///     let mock = MockClassifier::new().with_result(Diagnosis::Uninfected, 0.04);
///     let response = mock.classify("cell.png".as_ref()).await.unwrap();
///     assert_eq!(response.diagnosis.as_deref(), Some("uninfected"));
/// }
/// ```
pub struct MockClassifier {
    response: RwLock<AnalysisResponse>,
    health: RwLock<HealthResponse>,
    model_info: RwLock<ModelInfo>,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    classify_count: AtomicU32,
    health_count: AtomicU32,
    /// Simulated classify latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClassifier")
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field("classify_count", &self.classify_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClassifier {
    /// Create a healthy mock that classifies every image as parasitized.
    pub fn new() -> Self {
        Self {
            response: RwLock::new(Self::response_for(Diagnosis::Parasitized, 0.93)),
            health: RwLock::new(HealthResponse {
                status: "healthy".to_string(),
                service: "mock".to_string(),
                device: "cpu".to_string(),
                model_loaded: true,
            }),
            model_info: RwLock::new(ModelInfo {
                model_name: DEFAULT_MODEL.to_string(),
                total_parameters: 4_010_110,
                input_size: 224,
                device: "cpu".to_string(),
            }),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            classify_count: AtomicU32::new(0),
            health_count: AtomicU32::new(0),
            latency_ms: AtomicU64::new(0),
        }
    }

    fn response_for(diagnosis: Diagnosis, confidence: f64) -> AnalysisResponse {
        AnalysisResponse {
            diagnosis: Some(diagnosis.as_str().to_string()),
            confidence: Some(confidence),
            processing_time: Some(0.42),
            model_used: Some(DEFAULT_MODEL.to_string()),
            error: None,
        }
    }

    /// Classify every image with this diagnosis and confidence.
    pub fn with_result(mut self, diagnosis: Diagnosis, confidence: f64) -> Self {
        self.response = RwLock::new(Self::response_for(diagnosis, confidence));
        self
    }

    /// Answer every upload with this exact body.
    pub fn with_response(mut self, response: AnalysisResponse) -> Self {
        self.response = RwLock::new(response);
        self
    }

    /// Report a reachable service that has no model loaded.
    pub fn without_model(mut self) -> Self {
        self.health = RwLock::new(HealthResponse {
            status: "model_not_loaded".to_string(),
            service: "mock".to_string(),
            device: "cpu".to_string(),
            model_loaded: false,
        });
        self
    }

    /// Replace the analysis response.
    pub async fn set_response(&self, response: AnalysisResponse) {
        *self.response.write().await = response;
    }

    /// Replace the health response.
    pub async fn set_health(&self, health: HealthResponse) {
        *self.health.write().await = health;
    }

    /// Make every call fail (or succeed again).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Set simulated classify latency.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of classify calls made.
    pub fn classify_count(&self) -> u32 {
        self.classify_count.load(Ordering::Relaxed)
    }

    /// Number of health calls made.
    pub fn health_count(&self) -> u32 {
        self.health_count.load(Ordering::Relaxed)
    }

    async fn check_fail(&self) -> Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(InferenceError::ApiError {
                status: 503,
                message: self.fail_message.read().await.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn health(&self) -> Result<HealthResponse> {
        self.health_count.fetch_add(1, Ordering::Relaxed);
        self.check_fail().await?;
        Ok(self.health.read().await.clone())
    }

    async fn model_info(&self) -> Result<ModelInfo> {
        self.check_fail().await?;
        Ok(self.model_info.read().await.clone())
    }

    async fn classify(&self, _image: &Path) -> Result<AnalysisResponse> {
        self.classify_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.check_fail().await?;
        Ok(self.response.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_defaults() {
        let mock = MockClassifier::new();
        assert!(mock.health().await.unwrap().is_ready());

        let prediction = mock
            .classify(Path::new("a.png"))
            .await
            .unwrap()
            .into_prediction();
        assert_eq!(prediction.diagnosis, Diagnosis::Parasitized);
        assert_eq!(mock.classify_count(), 1);
        assert_eq!(mock.health_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockClassifier::new();
        mock.set_should_fail(true, Some("down")).await;

        let err = mock.classify(Path::new("a.png")).await.unwrap_err();
        assert!(matches!(err, InferenceError::ApiError { status: 503, ref message } if message == "down"));

        mock.set_should_fail(false, None).await;
        assert!(mock.classify(Path::new("a.png")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_without_model() {
        let mock = MockClassifier::new().without_model();
        assert!(!mock.health().await.unwrap().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let mock = MockClassifier::new();
        mock.set_latency(Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        mock.classify(Path::new("a.png")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
