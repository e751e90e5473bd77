//! Output formatting utilities for text, JSON, and CSV output.

use std::path::Path;

use anyhow::Result;
use malaria_core::{AnalysisOutcome, HealthResponse, ModelInfo};
use malaria_store::records_to_csv;
use malaria_types::validation::human_size;
use malaria_types::{AnalysisRecord, Diagnosis, Language};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::commands::StoreSummary;
use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
    /// Language for diagnosis labels.
    pub language: Language,
}

impl FormatOptions {
    pub fn new(no_color: bool, language: Language) -> Self {
        Self {
            no_color,
            language,
            ..Default::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn diagnosis(&self, diagnosis: Diagnosis) -> String {
        style::diagnosis_label(diagnosis, self.language, self.no_color)
    }

    fn dimmed(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.dimmed().to_string()
        }
    }
}

/// Escape a string for CSV output.
/// Wraps the value in quotes if it contains commas, quotes, or newlines.
/// Double quotes are escaped by doubling them.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Analysis formatting
// ============================================================================

#[must_use]
pub fn format_outcome_text(outcome: &AnalysisOutcome, opts: &FormatOptions) -> String {
    let prediction = &outcome.prediction;
    let mut output = format!("File:        {}\n", outcome.image_path.display());
    output.push_str(&format!(
        "Diagnosis:   {}\n",
        opts.diagnosis(prediction.diagnosis)
    ));

    if let Some(error) = &prediction.error {
        output.push_str(&format!("Error:       {}\n", error));
        return output;
    }

    output.push_str(&format!(
        "Confidence:  {}%\n",
        prediction.confidence_percentage()
    ));
    output.push_str(&format!("Time:        {:.2} s\n", prediction.processing_time));
    output.push_str(&format!("Model:       {}\n", prediction.model_used));
    match outcome.record_id {
        Some(id) => output.push_str(&format!("Saved:       #{}\n", id)),
        None => output.push_str(&format!("Saved:       {}\n", opts.dimmed("no"))),
    }
    output
}

pub fn format_outcome_json(outcome: &AnalysisOutcome, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct OutcomeJson<'a> {
        image_path: String,
        diagnosis: Diagnosis,
        label: &'a str,
        confidence: f64,
        processing_time: f64,
        model_used: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
        record_id: Option<i64>,
    }

    let prediction = &outcome.prediction;
    opts.as_json(&OutcomeJson {
        image_path: path_text(&outcome.image_path),
        diagnosis: prediction.diagnosis,
        label: prediction.diagnosis.label(opts.language),
        confidence: prediction.confidence,
        processing_time: prediction.processing_time,
        model_used: &prediction.model_used,
        error: prediction.error.as_deref(),
        record_id: outcome.record_id,
    })
}

#[must_use]
pub fn format_outcome_csv(outcome: &AnalysisOutcome, opts: &FormatOptions) -> String {
    let prediction = &outcome.prediction;
    let mut output = if opts.no_header {
        String::new()
    } else {
        "image_path,diagnosis,confidence,processing_time,model_used,record_id,error\n".to_string()
    };
    output.push_str(&format!(
        "{},{},{},{},{},{},{}\n",
        csv_escape(&path_text(&outcome.image_path)),
        prediction.diagnosis,
        prediction.confidence,
        prediction.processing_time,
        csv_escape(&prediction.model_used),
        outcome.record_id.map(|id| id.to_string()).unwrap_or_default(),
        csv_escape(prediction.error.as_deref().unwrap_or_default()),
    ));
    output
}

// ============================================================================
// History formatting
// ============================================================================

#[must_use]
pub fn format_history_text(records: &[AnalysisRecord], opts: &FormatOptions) -> String {
    use tabled::builder::Builder;

    if records.is_empty() {
        return "No analyses found.\n".to_string();
    }

    let mut output = format!("History ({} records):\n\n", records.len());

    let mut builder = Builder::default();
    builder.push_record([
        "ID",
        "Date",
        "File",
        "Diagnosis",
        "Confidence",
        "Time",
        "Model",
    ]);

    for record in records {
        builder.push_record([
            record.id.to_string(),
            record.formatted_date(),
            record.file_name.clone(),
            opts.diagnosis(record.diagnosis),
            format!("{:.0}%", record.confidence * 100.0),
            format!("{:.2} s", record.processing_time),
            record.model_used.clone(),
        ]);
    }

    let mut table = builder.build();
    style::apply_table_style(&mut table, opts.no_color);
    output.push_str(&table.to_string());
    output.push('\n');
    output
}

/// History as CSV, with the same columns as `malaria export`.
pub fn format_history_csv(records: &[AnalysisRecord], opts: &FormatOptions) -> Result<String> {
    Ok(records_to_csv(records, !opts.no_header)?)
}

pub fn format_history_json(records: &[AnalysisRecord], opts: &FormatOptions) -> Result<String> {
    opts.as_json(&records)
}

// ============================================================================
// Service formatting
// ============================================================================

#[must_use]
pub fn format_health_text(
    url: &str,
    health: &HealthResponse,
    model: Option<&ModelInfo>,
    opts: &FormatOptions,
) -> String {
    let status = if opts.no_color {
        format!("[{}]", health.status)
    } else if health.is_ready() {
        format!("[{}]", health.status.green())
    } else {
        format!("[{}]", health.status.yellow())
    };

    let mut output = format!("Service:     {} {}\n", url, status);
    if !health.service.is_empty() {
        output.push_str(&format!("Name:        {}\n", health.service));
    }
    if !health.device.is_empty() {
        output.push_str(&format!("Device:      {}\n", health.device));
    }
    output.push_str(&format!(
        "Model:       {}\n",
        if health.model_loaded {
            "loaded"
        } else {
            "not loaded"
        }
    ));

    if let Some(model) = model {
        output.push_str(&format!("Model name:  {}\n", model.model_name));
        output.push_str(&format!(
            "Parameters:  {}\n",
            group_thousands(model.total_parameters)
        ));
        output.push_str(&format!(
            "Input size:  {}x{}\n",
            model.input_size, model.input_size
        ));
    }
    output
}

pub fn format_health_json(
    url: &str,
    health: &HealthResponse,
    model: Option<&ModelInfo>,
    opts: &FormatOptions,
) -> Result<String> {
    #[derive(Serialize)]
    struct HealthJson<'a> {
        url: &'a str,
        ready: bool,
        #[serde(flatten)]
        health: &'a HealthResponse,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<&'a ModelInfo>,
    }

    opts.as_json(&HealthJson {
        url,
        ready: health.is_ready(),
        health,
        model,
    })
}

#[must_use]
pub fn format_health_csv(
    url: &str,
    health: &HealthResponse,
    model: Option<&ModelInfo>,
    opts: &FormatOptions,
) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        "url,status,ready,device,model_loaded,model_name,total_parameters,input_size\n".to_string()
    };
    output.push_str(&format!(
        "{},{},{},{},{},{},{},{}\n",
        csv_escape(url),
        csv_escape(&health.status),
        health.is_ready(),
        csv_escape(&health.device),
        health.model_loaded,
        model.map(|m| csv_escape(&m.model_name)).unwrap_or_default(),
        model.map(|m| m.total_parameters.to_string()).unwrap_or_default(),
        model.map(|m| m.input_size.to_string()).unwrap_or_default(),
    ));
    output
}

/// `4010110` -> `4,010,110`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Store info formatting
// ============================================================================

#[must_use]
pub fn format_info_text(summary: &StoreSummary, opts: &FormatOptions) -> String {
    let mut output = format!("Database:    {}\n", summary.path.display());
    output.push_str(&format!("Size:        {}\n", human_size(summary.size_bytes)));
    output.push_str(&format!("Analyses:    {}\n", summary.total));
    for (diagnosis, count) in [
        (Diagnosis::Parasitized, summary.parasitized),
        (Diagnosis::Uninfected, summary.uninfected),
        (Diagnosis::Error, summary.errors),
    ] {
        output.push_str(&format!("  {}: {}\n", opts.diagnosis(diagnosis), count));
    }
    output
}

#[must_use]
pub fn format_info_csv(summary: &StoreSummary, opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        "path,size_bytes,total,parasitized,uninfected,error\n".to_string()
    };
    output.push_str(&format!(
        "{},{},{},{},{},{}\n",
        csv_escape(&path_text(&summary.path)),
        summary.size_bytes,
        summary.total,
        summary.parasitized,
        summary.uninfected,
        summary.errors,
    ));
    output
}
