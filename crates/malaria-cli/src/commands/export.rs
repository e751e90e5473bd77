//! Export command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::{ExportFormat, FilterArgs};
use crate::util::{open_store, write_output};

pub fn cmd_export(
    format: ExportFormat,
    filter: &FilterArgs,
    database: Option<&Path>,
    output: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    let query = filter.to_query()?;
    let store = open_store(database)?;

    let content = match format {
        ExportFormat::Csv => store.export_csv(&query).context("Failed to export history")?,
        ExportFormat::Json => {
            store.export_json(&query).context("Failed to export history")? + "\n"
        }
    };

    write_output(output, &content)?;

    if let Some(path) = output
        && !quiet
    {
        eprintln!("Exported history to {}", path.display());
    }
    Ok(())
}
