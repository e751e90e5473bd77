//! Health command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use malaria_core::InferenceClient;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_health_csv, format_health_json, format_health_text};
use crate::style;
use crate::util::write_output;

/// Check the inference service and describe its model.
///
/// Fails when the service cannot be reached or has no model loaded.
pub async fn cmd_health(
    service_url: &str,
    timeout: Duration,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let client = InferenceClient::with_timeout(service_url, timeout)
        .with_context(|| format!("Invalid service URL: {}", service_url))?;

    let spinner = (!quiet && format == OutputFormat::Text)
        .then(|| style::operation_spinner(&format!("Checking {}...", client.base_url())));

    let health = client.health().await;
    let model = match &health {
        Ok(h) if h.model_loaded => match client.model_info().await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Could not read model info: {}", e);
                None
            }
        },
        _ => None,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let health = health
        .with_context(|| format!("Health check against {} failed", client.base_url()))?;

    let url = client.base_url();
    let content = match format {
        OutputFormat::Json => format_health_json(url, &health, model.as_ref(), opts)?,
        OutputFormat::Text => format_health_text(url, &health, model.as_ref(), opts),
        OutputFormat::Csv => format_health_csv(url, &health, model.as_ref(), opts),
    };
    write_output(output, &content)?;

    if !health.is_ready() {
        bail!("Inference service is not ready (status: {})", health.status);
    }
    Ok(())
}
