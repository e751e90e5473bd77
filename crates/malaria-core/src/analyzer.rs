//! The analyse-one-image workflow.
//!
//! An [`Analyzer`] runs the same steps for every image:
//!
//! 1. Validate the file locally (exists, non-empty, supported format)
//! 2. Ask the service whether it is healthy and has a model loaded
//! 3. Upload the image and decode the response
//! 4. Save the result to history, if one is attached
//!
//! Any failure along the way becomes a [`Prediction`] with
//! [`Diagnosis::Error`](malaria_types::Diagnosis::Error) and a message.
//! Failed analyses are only saved when [`Analyzer::persist_failures`] is on.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use malaria_types::validation::validate_image;
use malaria_types::{AnalysisRecord, Prediction};

use crate::error::{Error, Result};
use crate::history::AnalysisHistory;
use crate::traits::Classifier;

/// What came out of analysing one image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// The analysed file, as given.
    pub image_path: PathBuf,
    /// Diagnosis, or the reason there is none.
    pub prediction: Prediction,
    /// Id of the saved history record, if one was saved.
    pub record_id: Option<i64>,
}

impl AnalysisOutcome {
    /// True if the result made it into history.
    pub fn is_saved(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Runs classifications and records them.
pub struct Analyzer<C> {
    classifier: C,
    history: Option<AnalysisHistory>,
    persist_failures: bool,
}

impl<C: std::fmt::Debug> std::fmt::Debug for Analyzer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("classifier", &self.classifier)
            .field("history", &self.history.is_some())
            .field("persist_failures", &self.persist_failures)
            .finish()
    }
}

impl<C: Classifier> Analyzer<C> {
    /// Create an analyzer that does not save results.
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            history: None,
            persist_failures: false,
        }
    }

    /// Save results to this history.
    pub fn with_history(mut self, history: AnalysisHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Also save failed analyses, as `error` records.
    pub fn persist_failures(mut self, persist: bool) -> Self {
        self.persist_failures = persist;
        self
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// The attached history, if any.
    pub fn history(&self) -> Option<&AnalysisHistory> {
        self.history.as_ref()
    }

    /// Classify an image without saving, reporting failures as errors.
    pub async fn classify(&self, image: &Path) -> Result<Prediction> {
        let prediction = self.request(image).await?;
        match prediction.error {
            Some(message) => Err(Error::Rejected(message)),
            None => Ok(prediction),
        }
    }

    /// Validate, check health and upload. A prediction the service marked
    /// as failed is returned as is, with its timing and model.
    async fn request(&self, image: &Path) -> Result<Prediction> {
        let size = validate_image(image)?;
        debug!("Validated {} ({} bytes)", image.display(), size);

        let health = self.classifier.health().await?;
        if !health.is_ready() {
            return Err(Error::ServiceNotReady {
                status: health.status,
                model_loaded: health.model_loaded,
            });
        }

        Ok(self.classifier.classify(image).await?.into_prediction())
    }

    /// Analyse an image and save the outcome according to policy.
    ///
    /// Never fails: errors are folded into the returned prediction.
    pub async fn analyze(&self, image: &Path) -> AnalysisOutcome {
        let prediction = match self.request(image).await {
            Ok(prediction) if prediction.is_successful() => {
                info!(
                    "{}: {} ({}%)",
                    image.display(),
                    prediction.diagnosis,
                    prediction.confidence_percentage()
                );
                prediction
            }
            Ok(mut prediction) => {
                let message = prediction
                    .error
                    .take()
                    .unwrap_or_else(|| "The service could not classify the image".to_string());
                let message = Error::Rejected(message).to_string();
                warn!("Analysis of {} failed: {}", image.display(), message);
                prediction.error = Some(message);
                prediction
            }
            Err(e) => {
                warn!("Analysis of {} failed: {}", image.display(), e);
                Prediction::failed(e.to_string())
            }
        };

        let record_id = match &self.history {
            Some(history) if prediction.is_successful() || self.persist_failures => {
                history.record(&AnalysisRecord::from_prediction(image, &prediction))
            }
            _ => None,
        };

        AnalysisOutcome {
            image_path: image.to_path_buf(),
            prediction,
            record_id,
        }
    }
}
