//! Info command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use malaria_store::Store;
use malaria_types::Diagnosis;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_info_csv, format_info_text};
use crate::util::{open_store, write_output};

/// Location, size and contents of the history database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub total: u64,
    pub parasitized: u64,
    pub uninfected: u64,
    pub errors: u64,
}

impl StoreSummary {
    pub fn collect(store: &Store) -> Result<Self> {
        let path = store.path().map(Path::to_path_buf).unwrap_or_default();
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let count = |diagnosis: Option<Diagnosis>| {
            store
                .count(diagnosis)
                .context("Failed to count analyses")
        };

        Ok(Self {
            size_bytes,
            total: count(None)?,
            parasitized: count(Some(Diagnosis::Parasitized))?,
            uninfected: count(Some(Diagnosis::Uninfected))?,
            errors: count(Some(Diagnosis::Error))?,
            path,
        })
    }
}

pub fn cmd_info(
    database: Option<&Path>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let store = open_store(database)?;
    let summary = StoreSummary::collect(&store)?;

    let content = match format {
        OutputFormat::Json => opts.as_json(&summary)?,
        OutputFormat::Text => format_info_text(&summary, opts),
        OutputFormat::Csv => format_info_csv(&summary, opts),
    };

    write_output(output, &content)
}
