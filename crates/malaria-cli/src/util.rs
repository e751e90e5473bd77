//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use malaria_store::{AnalysisQuery, Store};
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, Time};

use crate::cli::FilterArgs;

/// Which end of a date range a date-only value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Midnight at the start of the day.
    Start,
    /// The last instant of the day.
    End,
}

/// Parse a date/time string in RFC3339 or YYYY-MM-DD format.
///
/// A bare date is taken in UTC and expanded according to `bound`, so
/// `--until 2026-03-10` still includes analyses made that evening.
pub fn parse_datetime(s: &str, bound: DateBound) -> Result<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }

    if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        let clock = match bound {
            DateBound::Start => Time::MIDNIGHT,
            DateBound::End => time!(23:59:59.999999999),
        };
        return Ok(date.with_time(clock).assume_utc());
    }

    bail!(
        "Invalid date format '{}'. Use RFC3339 (e.g., 2026-01-15T10:30:00Z) or YYYY-MM-DD",
        s
    )
}

impl FilterArgs {
    /// Build the store query, failing fast on bad dates.
    pub fn to_query(&self) -> Result<AnalysisQuery> {
        let mut query = AnalysisQuery::new().maybe_diagnosis(self.diagnosis);

        if let Some(since) = &self.since {
            query = query.since(parse_datetime(since, DateBound::Start)?);
        }
        if let Some(until) = &self.until {
            query = query.until(parse_datetime(until, DateBound::End)?);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if self.oldest_first {
            query = query.oldest_first();
        }

        Ok(query)
    }
}

/// Open the history database at `path`, or at the default location.
pub fn open_store(path: Option<&Path>) -> Result<Store> {
    match path {
        Some(path) => Store::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display())),
        None => Store::open_default().context("Failed to open database"),
    }
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
