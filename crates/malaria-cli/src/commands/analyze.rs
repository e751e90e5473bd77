//! Analyze command implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use malaria_core::{AnalysisHistory, Analyzer, InferenceClient};
use malaria_types::file_name_of;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_outcome_csv, format_outcome_json, format_outcome_text};
use crate::style;
use crate::util::{open_store, write_output};

/// Arguments for the analyze command.
pub struct AnalyzeArgs<'a> {
    pub image: &'a Path,
    pub service_url: &'a str,
    pub timeout: Duration,
    /// `None` disables saving.
    pub history: Option<Option<&'a Path>>,
    pub persist_failures: bool,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

/// Run one analysis and print the outcome.
///
/// The outcome is printed even when the analysis fails; the command then
/// exits with an error carrying the failure message.
pub async fn cmd_analyze(args: AnalyzeArgs<'_>) -> Result<()> {
    let AnalyzeArgs {
        image,
        service_url,
        timeout,
        history,
        persist_failures,
        format,
        output,
        quiet,
        opts,
    } = args;

    let client = InferenceClient::with_timeout(service_url, timeout)
        .with_context(|| format!("Invalid service URL: {}", service_url))?;

    let mut analyzer = Analyzer::new(client).persist_failures(persist_failures);
    if let Some(database) = history {
        analyzer = analyzer.with_history(AnalysisHistory::new(open_store(database)?));
    }

    let spinner = (!quiet && format == OutputFormat::Text)
        .then(|| style::analyzing_spinner(&file_name_of(image)));

    let outcome = analyzer.analyze(image).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let content = match format {
        OutputFormat::Json => format_outcome_json(&outcome, opts)?,
        OutputFormat::Text => format_outcome_text(&outcome, opts),
        OutputFormat::Csv => format_outcome_csv(&outcome, opts),
    };
    write_output(output, &content)?;

    if let Some(error) = &outcome.prediction.error {
        bail!("{}: {}", image.display(), error);
    }
    if analyzer.history().is_some() && !outcome.is_saved() && !quiet {
        eprintln!("Warning: the result could not be saved to history");
    }
    Ok(())
}
