//! Terminal styling: spinners, table style and diagnosis colors.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use malaria_types::{Diagnosis, Language};
use owo_colors::OwoColorize;

/// Braille spinner frames
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

/// Get the standard spinner style.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Create a spinner for a running analysis.
pub fn analyzing_spinner(file_name: &str) -> ProgressBar {
    operation_spinner(&format!("Analyzing {}...", file_name))
}

/// Create a spinner for generic operations.
pub fn operation_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

pub fn apply_table_style(table: &mut tabled::Table, no_color: bool) {
    use tabled::settings::Style;
    if no_color {
        table.with(Style::ascii());
    } else {
        table.with(Style::rounded());
    }
}

/// Diagnosis label, colored red/green/dimmed unless `no_color`.
#[must_use]
pub fn diagnosis_label(diagnosis: Diagnosis, language: Language, no_color: bool) -> String {
    let label = diagnosis.label(language);
    if no_color {
        return label.to_string();
    }
    match diagnosis {
        Diagnosis::Parasitized => label.red().bold().to_string(),
        Diagnosis::Uninfected => label.green().to_string(),
        Diagnosis::Error => label.dimmed().to_string(),
    }
}
