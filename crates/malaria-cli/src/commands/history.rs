//! History command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use malaria_core::AnalysisHistory;

use crate::cli::{FilterArgs, OutputFormat};
use crate::format::{FormatOptions, format_history_csv, format_history_json, format_history_text};
use crate::util::{open_store, write_output};

/// List stored analyses.
///
/// Reads go through [`AnalysisHistory`], so an unreadable database shows
/// up as an empty list plus a logged warning.
pub fn cmd_history(
    filter: &FilterArgs,
    database: Option<&Path>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    // Parse date filters upfront to fail fast
    let query = filter.to_query()?;
    let history = AnalysisHistory::new(open_store(database)?);

    let records = history.query(&query);

    let content = match format {
        OutputFormat::Json => format_history_json(&records, opts)?,
        OutputFormat::Text => format_history_text(&records, opts),
        OutputFormat::Csv => format_history_csv(&records, opts)?,
    };

    write_output(output, &content)
}
