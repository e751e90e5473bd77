//! Inference client and analysis workflow for the malaria cell classifier.
//!
//! This crate connects the external inference service to local history:
//!
//! - [`InferenceClient`]: HTTP client for the service's `/analyze`,
//!   `/health` and `/model-info` endpoints
//! - [`Classifier`]: the seam between the workflow and the service, with a
//!   [`MockClassifier`] for tests
//! - [`AnalysisHistory`]: the non-failing facade over
//!   [`malaria_store::Store`] that display code reads from
//! - [`Analyzer`]: validate, health-check, upload, record
//!
//! # Quick Start
//!
//! ```no_run
//! use malaria_core::{AnalysisHistory, Analyzer, InferenceClient};
//! use malaria_store::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InferenceClient::new("http://localhost:8000")?;
//!     let history = AnalysisHistory::new(Store::open_default()?);
//!     let analyzer = Analyzer::new(client).with_history(history);
//!
//!     let outcome = analyzer.analyze("cell_01.png".as_ref()).await;
//!     println!("{}", outcome.prediction.diagnosis);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod error;
pub mod history;
pub mod inference;
pub mod mock;
pub mod traits;

pub use analyzer::{AnalysisOutcome, Analyzer};
pub use error::{Error, Result};
pub use history::AnalysisHistory;
pub use inference::{
    AnalysisResponse, DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT, HealthResponse, InferenceClient,
    InferenceError, ModelInfo,
};
pub use mock::MockClassifier;
pub use traits::Classifier;

// Re-export the crates callers need alongside this one
pub use malaria_store;
pub use malaria_types;
