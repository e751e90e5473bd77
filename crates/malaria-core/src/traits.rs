//! Trait abstraction over the inference service.
//!
//! [`Classifier`] lets the analysis workflow run against the real HTTP
//! client or against [`MockClassifier`](crate::MockClassifier) in tests.

use std::path::Path;

use async_trait::async_trait;

use crate::inference::{AnalysisResponse, HealthResponse, InferenceClient, ModelInfo, Result};

/// Something that can classify a cell image.
///
/// # Example
///
/// ```ignore
/// use malaria_core::Classifier;
///
/// async fn ready<C: Classifier>(classifier: &C) -> bool {
///     classifier.health().await.is_ok_and(|h| h.is_ready())
/// }
/// ```
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Report liveness and whether a model is loaded.
    async fn health(&self) -> Result<HealthResponse>;

    /// Describe the loaded model.
    async fn model_info(&self) -> Result<ModelInfo>;

    /// Classify the image at `image`.
    async fn classify(&self, image: &Path) -> Result<AnalysisResponse>;
}

#[async_trait]
impl Classifier for InferenceClient {
    async fn health(&self) -> Result<HealthResponse> {
        InferenceClient::health(self).await
    }

    async fn model_info(&self) -> Result<ModelInfo> {
        InferenceClient::model_info(self).await
    }

    async fn classify(&self, image: &Path) -> Result<AnalysisResponse> {
        self.analyze(image).await
    }
}
