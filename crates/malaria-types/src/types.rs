//! Core types for malaria cell analyses.

use core::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::ParseError;

/// Model name reported when the inference service does not name one.
pub const DEFAULT_MODEL: &str = "EfficientNet-B0";

/// Outcome of classifying one blood-cell image.
///
/// The set is closed: a diagnosis stored on disk or received from the
/// inference service is always one of these three values.
///
/// # Display vs Serialization
///
/// Both `Display` and serde use the lowercase wire names
/// (`"parasitized"`, `"uninfected"`, `"error"`). Use [`Diagnosis::label`]
/// for human-readable text.
///
/// ```
/// use malaria_types::{Diagnosis, Language};
///
/// assert_eq!(Diagnosis::Parasitized.to_string(), "parasitized");
/// assert_eq!(Diagnosis::Uninfected.label(Language::Russian), "Не заражено");
/// assert_eq!("ERROR".parse::<Diagnosis>(), Ok(Diagnosis::Error));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Diagnosis {
    /// The cell is infected with the malaria parasite.
    Parasitized,
    /// The cell is healthy.
    Uninfected,
    /// Classification failed.
    Error,
}

impl Diagnosis {
    /// All diagnosis values, in display order.
    pub const ALL: [Diagnosis; 3] = [
        Diagnosis::Parasitized,
        Diagnosis::Uninfected,
        Diagnosis::Error,
    ];

    /// The canonical text form used on disk and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Parasitized => "parasitized",
            Diagnosis::Uninfected => "uninfected",
            Diagnosis::Error => "error",
        }
    }

    /// Human-readable label in the given language.
    #[must_use]
    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, Diagnosis::Parasitized) => "Parasitized",
            (Language::English, Diagnosis::Uninfected) => "Uninfected",
            (Language::English, Diagnosis::Error) => "Error",
            (Language::Russian, Diagnosis::Parasitized) => "Заражено",
            (Language::Russian, Diagnosis::Uninfected) => "Не заражено",
            (Language::Russian, Diagnosis::Error) => "Ошибка",
        }
    }

    /// Map a diagnosis string reported by the inference service.
    ///
    /// Unlike [`FromStr`], this never fails: anything the service reports
    /// that is not a known class counts as a failed classification.
    #[must_use]
    pub fn from_service(value: &str) -> Self {
        value.parse().unwrap_or(Diagnosis::Error)
    }

    /// Returns true for a completed classification (not [`Diagnosis::Error`]).
    #[must_use]
    pub fn is_classified(&self) -> bool {
        !matches!(self, Diagnosis::Error)
    }
}

impl FromStr for Diagnosis {
    type Err = ParseError;

    /// Parse a diagnosis, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parasitized" => Ok(Diagnosis::Parasitized),
            "uninfected" => Ok(Diagnosis::Uninfected),
            "error" => Ok(Diagnosis::Error),
            _ => Err(ParseError::UnknownDiagnosis(s.to_string())),
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language used for user-facing labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Language {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "en"))]
    English,
    #[cfg_attr(feature = "serde", serde(rename = "ru"))]
    Russian,
}

impl Language {
    /// Two-letter language code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ru" | "russian" => Ok(Language::Russian),
            _ => Err(ParseError::UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of one classification request, as reported by the classifier.
///
/// A prediction is produced for every attempt: failures carry
/// [`Diagnosis::Error`] and an explanatory message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prediction {
    /// Classification outcome.
    pub diagnosis: Diagnosis,
    /// Probability-like score in `[0.0, 1.0]`; meaningless for errors.
    pub confidence: f64,
    /// Classifier latency in seconds.
    pub processing_time: f64,
    /// Classifier version identifier.
    pub model_used: String,
    /// Why the classification failed, if it did.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl Prediction {
    /// Create a successful prediction.
    pub fn new(
        diagnosis: Diagnosis,
        confidence: f64,
        processing_time: f64,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            diagnosis,
            confidence,
            processing_time,
            model_used: model_used.into(),
            error: None,
        }
    }

    /// Create a failed prediction with the given reason.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            diagnosis: Diagnosis::Error,
            confidence: 0.0,
            processing_time: 0.0,
            model_used: String::new(),
            error: Some(message.into()),
        }
    }

    /// True when the image was classified and no error was reported.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.diagnosis.is_classified() && self.error.is_none()
    }

    /// Confidence as a whole percentage, clamped to `0..=100`.
    #[must_use]
    pub fn confidence_percentage(&self) -> u8 {
        (clamp_confidence(self.confidence) * 100.0) as u8
    }
}

/// One completed (or failed) classification attempt, as kept in history.
///
/// Records are immutable once stored. `id` is `0` until the store assigns
/// one on insert.
///
/// # Example
///
/// ```
/// use malaria_types::{AnalysisRecord, Diagnosis};
///
/// let record = AnalysisRecord::new(
///     "/data/cells/cell_01.png",
///     Diagnosis::Parasitized,
///     0.93,
///     0.42,
///     "EfficientNet-B0",
/// );
/// assert_eq!(record.id, 0);
/// assert_eq!(record.file_name, "cell_01.png");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisRecord {
    /// Store-assigned identifier (`0` before persistence).
    pub id: i64,
    /// Absolute path of the analysed image at analysis time.
    pub image_path: PathBuf,
    /// Display name derived from `image_path`.
    pub file_name: String,
    /// Classification outcome.
    pub diagnosis: Diagnosis,
    /// Probability-like score in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Classifier latency in seconds.
    pub processing_time: f64,
    /// Classifier version identifier.
    pub model_used: String,
    /// When the analysis was made.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub analysis_date: OffsetDateTime,
}

impl AnalysisRecord {
    /// Create an unsaved record dated now.
    pub fn new(
        image_path: impl Into<PathBuf>,
        diagnosis: Diagnosis,
        confidence: f64,
        processing_time: f64,
        model_used: impl Into<String>,
    ) -> Self {
        let image_path = image_path.into();
        Self {
            id: 0,
            file_name: file_name_of(&image_path),
            image_path,
            diagnosis,
            confidence,
            processing_time,
            model_used: model_used.into(),
            analysis_date: OffsetDateTime::now_utc(),
        }
    }

    /// Build a record for a classifier result.
    ///
    /// Relative image paths are resolved against the current directory.
    /// Confidence is clamped to `[0.0, 1.0]` and zeroed for failed
    /// classifications; processing time is floored at zero.
    pub fn from_prediction(image_path: impl Into<PathBuf>, prediction: &Prediction) -> Self {
        let image_path = image_path.into();
        let image_path = std::path::absolute(&image_path).unwrap_or(image_path);
        let confidence = if prediction.diagnosis.is_classified() {
            clamp_confidence(prediction.confidence)
        } else {
            0.0
        };
        let model_used = if prediction.model_used.is_empty() {
            DEFAULT_MODEL
        } else {
            prediction.model_used.as_str()
        };

        Self::new(
            image_path,
            prediction.diagnosis,
            confidence,
            prediction.processing_time.max(0.0),
            model_used,
        )
    }

    /// Override the analysis timestamp.
    #[must_use]
    pub fn with_analysis_date(mut self, date: OffsetDateTime) -> Self {
        self.analysis_date = date;
        self
    }

    /// True once the store has assigned an id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Date and time for display, e.g. `17.10.2026 14:05`.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.analysis_date
            .format(format_description!(
                "[day].[month].[year] [hour]:[minute]"
            ))
            .unwrap_or_default()
    }

    /// Calendar date for display, e.g. `17.10.2026`.
    #[must_use]
    pub fn formatted_day(&self) -> String {
        self.analysis_date
            .format(format_description!("[day].[month].[year]"))
            .unwrap_or_default()
    }
}

/// Display name for an image path: the final component, or the whole path
/// when there is none.
#[must_use]
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
