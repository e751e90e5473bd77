//! Platform-agnostic types for the malaria cell classifier client.
//!
//! This crate provides shared types used by the local history store
//! (malaria-store), the inference client (malaria-core) and the CLI.
//!
//! # Features
//!
//! - [`Diagnosis`]: the closed set of classification outcomes
//! - [`Prediction`]: a single classifier result
//! - [`AnalysisRecord`]: the durable unit of analysis history
//! - Image validation helpers in [`validation`]
//! - Localized labels via [`Language`]
//!
//! # Example
//!
//! ```
//! use malaria_types::{AnalysisRecord, Diagnosis, Prediction};
//!
//! let prediction = Prediction::new(Diagnosis::Uninfected, 0.12, 0.31, "EfficientNet-B0");
//! let record = AnalysisRecord::from_prediction("/tmp/cell.png", &prediction);
//! assert_eq!(record.diagnosis, Diagnosis::Uninfected);
//! ```

pub mod error;
pub mod types;
pub mod validation;

pub use error::{ImageError, ParseError, ParseResult};
pub use types::{AnalysisRecord, DEFAULT_MODEL, Diagnosis, Language, Prediction, file_name_of};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};
    use time::macros::datetime;

    // --- Diagnosis tests ---

    #[test]
    fn test_diagnosis_as_str() {
        assert_eq!(Diagnosis::Parasitized.as_str(), "parasitized");
        assert_eq!(Diagnosis::Uninfected.as_str(), "uninfected");
        assert_eq!(Diagnosis::Error.as_str(), "error");
    }

    #[test]
    fn test_diagnosis_parse_is_case_insensitive() {
        assert_eq!("Parasitized".parse::<Diagnosis>(), Ok(Diagnosis::Parasitized));
        assert_eq!(" uninfected ".parse::<Diagnosis>(), Ok(Diagnosis::Uninfected));
        assert_eq!("ERROR".parse::<Diagnosis>(), Ok(Diagnosis::Error));
    }

    #[test]
    fn test_diagnosis_parse_rejects_unknown() {
        let result = "infected".parse::<Diagnosis>();
        assert_eq!(
            result,
            Err(ParseError::UnknownDiagnosis("infected".to_string()))
        );
    }

    #[test]
    fn test_diagnosis_from_service_falls_back_to_error() {
        assert_eq!(Diagnosis::from_service("parasitized"), Diagnosis::Parasitized);
        assert_eq!(Diagnosis::from_service("Uninfected"), Diagnosis::Uninfected);
        assert_eq!(Diagnosis::from_service("model_not_loaded"), Diagnosis::Error);
        assert_eq!(Diagnosis::from_service(""), Diagnosis::Error);
    }

    #[test]
    fn test_diagnosis_labels() {
        assert_eq!(Diagnosis::Parasitized.label(Language::Russian), "Заражено");
        assert_eq!(Diagnosis::Uninfected.label(Language::Russian), "Не заражено");
        assert_eq!(Diagnosis::Error.label(Language::Russian), "Ошибка");
        assert_eq!(Diagnosis::Parasitized.label(Language::English), "Parasitized");
    }

    #[test]
    fn test_diagnosis_serialization() {
        assert_eq!(
            serde_json::to_string(&Diagnosis::Parasitized).unwrap(),
            "\"parasitized\""
        );
        let parsed: Diagnosis = serde_json::from_str("\"uninfected\"").unwrap();
        assert_eq!(parsed, Diagnosis::Uninfected);
        assert!(serde_json::from_str::<Diagnosis>("\"healthy\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_diagnosis_text_round_trip(index in 0usize..3) {
            let diagnosis = Diagnosis::ALL[index];
            prop_assert_eq!(diagnosis.as_str().parse::<Diagnosis>(), Ok(diagnosis));
            prop_assert_eq!(diagnosis.to_string(), diagnosis.as_str());
        }

        #[test]
        fn prop_unknown_text_never_parses(text in "[a-z]{1,12}") {
            prop_assume!(!["parasitized", "uninfected", "error"].contains(&text.as_str()));
            prop_assert!(text.parse::<Diagnosis>().is_err());
            prop_assert_eq!(Diagnosis::from_service(&text), Diagnosis::Error);
        }
    }

    // --- Language tests ---

    #[test]
    fn test_language_parse() {
        assert_eq!("ru".parse::<Language>(), Ok(Language::Russian));
        assert_eq!("English".parse::<Language>(), Ok(Language::English));
        assert!("de".parse::<Language>().is_err());
        assert_eq!(Language::default(), Language::English);
    }

    #[test]
    fn test_language_serialization() {
        assert_eq!(serde_json::to_string(&Language::Russian).unwrap(), "\"ru\"");
    }

    // --- Prediction tests ---

    #[test]
    fn test_prediction_success() {
        let prediction = Prediction::new(Diagnosis::Parasitized, 0.937, 0.42, DEFAULT_MODEL);
        assert!(prediction.is_successful());
        assert_eq!(prediction.confidence_percentage(), 93);
    }

    #[test]
    fn test_prediction_failed() {
        let prediction = Prediction::failed("service unavailable");
        assert!(!prediction.is_successful());
        assert_eq!(prediction.diagnosis, Diagnosis::Error);
        assert_eq!(prediction.error.as_deref(), Some("service unavailable"));
    }

    #[test]
    fn test_prediction_with_error_message_is_not_successful() {
        let mut prediction = Prediction::new(Diagnosis::Uninfected, 0.1, 0.2, DEFAULT_MODEL);
        prediction.error = Some("warning".to_string());
        assert!(!prediction.is_successful());
    }

    #[test]
    fn test_confidence_percentage_is_clamped() {
        let over = Prediction::new(Diagnosis::Parasitized, 1.7, 0.1, DEFAULT_MODEL);
        let under = Prediction::new(Diagnosis::Parasitized, -0.3, 0.1, DEFAULT_MODEL);
        assert_eq!(over.confidence_percentage(), 100);
        assert_eq!(under.confidence_percentage(), 0);
    }

    // --- AnalysisRecord tests ---

    #[test]
    fn test_record_new_derives_file_name() {
        let record = AnalysisRecord::new(
            "/data/cells/cell_01.png",
            Diagnosis::Parasitized,
            0.93,
            0.42,
            DEFAULT_MODEL,
        );
        assert_eq!(record.id, 0);
        assert!(!record.is_persisted());
        assert_eq!(record.file_name, "cell_01.png");
        assert_eq!(record.image_path, PathBuf::from("/data/cells/cell_01.png"));
    }

    #[test]
    fn test_file_name_of_without_component() {
        assert_eq!(file_name_of(Path::new("/")), "/");
        assert_eq!(file_name_of(Path::new("relative.bmp")), "relative.bmp");
    }

    #[test]
    fn test_record_from_prediction_clamps_confidence() {
        let prediction = Prediction::new(Diagnosis::Parasitized, 1.2, -1.0, "Custom");
        let record = AnalysisRecord::from_prediction("/tmp/a.png", &prediction);
        assert_eq!(record.confidence, 1.0);
        assert_eq!(record.processing_time, 0.0);
        assert_eq!(record.model_used, "Custom");
    }

    #[test]
    fn test_record_from_failed_prediction() {
        let mut prediction = Prediction::failed("timeout");
        prediction.confidence = 0.8;
        let record = AnalysisRecord::from_prediction("/tmp/a.png", &prediction);
        assert_eq!(record.diagnosis, Diagnosis::Error);
        assert_eq!(record.confidence, 0.0);
        assert_eq!(record.model_used, DEFAULT_MODEL);
    }

    #[test]
    fn test_record_from_prediction_resolves_relative_path() {
        let prediction = Prediction::new(Diagnosis::Uninfected, 0.2, 0.1, "m");
        let record = AnalysisRecord::from_prediction("cells/cell_rel.png", &prediction);
        assert!(record.image_path.is_absolute());
        assert!(record.image_path.ends_with("cells/cell_rel.png"));
        assert_eq!(record.file_name, "cell_rel.png");

        let absolute = AnalysisRecord::from_prediction("/tmp/a.png", &prediction);
        assert_eq!(absolute.image_path, Path::new("/tmp/a.png"));
    }

    #[test]
    fn test_record_formatted_dates() {
        let record = AnalysisRecord::new("/tmp/a.png", Diagnosis::Uninfected, 0.1, 0.1, "m")
            .with_analysis_date(datetime!(2026-03-07 09:05:00 UTC));
        assert_eq!(record.formatted_date(), "07.03.2026 09:05");
        assert_eq!(record.formatted_day(), "07.03.2026");
    }

    #[test]
    fn test_record_serialization_roundtrip() {
        let record = AnalysisRecord::new("/tmp/a.png", Diagnosis::Uninfected, 0.25, 0.5, "m")
            .with_analysis_date(datetime!(2026-01-15 10:30:00 UTC));

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"diagnosis\":\"uninfected\""));
        assert!(json.contains("2026-01-15T10:30:00Z"));

        let back: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
