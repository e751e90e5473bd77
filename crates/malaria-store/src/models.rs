//! Mapping between `analysis_records` rows and [`AnalysisRecord`].

use std::path::PathBuf;

use rusqlite::Row;
use rusqlite::types::Type;
use time::format_description::well_known::Iso8601;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use malaria_types::{AnalysisRecord, Diagnosis};

use crate::error::{Error, Result};

/// Columns selected for every record query, in [`record_from_row`] order.
pub(crate) const RECORD_COLUMNS: &str = "id, image_path, file_name, diagnosis, confidence, \
     processing_time, model_used, analysis_date";

/// Encode a timestamp for the `analysis_date` column.
///
/// Always UTC with nine fractional digits, so that string order equals
/// chronological order and range filters can compare text directly.
pub(crate) fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
    ts.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .map_err(|e| Error::InvalidTimestamp(e.to_string()))
}

/// Decode an `analysis_date` value.
///
/// Besides our own encoding this accepts zone-less ISO-8601 local
/// date-times, as written by the earlier desktop client, read as UTC.
pub(crate) fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    if let Ok(ts) = PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"),
    ) {
        return Ok(ts.assume_utc());
    }

    if let Ok(ts) = OffsetDateTime::parse(s, &Iso8601::DEFAULT) {
        return Ok(ts);
    }

    PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| Error::InvalidTimestamp(format!("{s}: {e}")))
}

/// Build an [`AnalysisRecord`] from a row selected with [`RECORD_COLUMNS`].
pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let diagnosis: String = row.get(3)?;
    let diagnosis = diagnosis
        .parse::<Diagnosis>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let analysis_date: String = row.get(7)?;
    let analysis_date = parse_timestamp(&analysis_date)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(AnalysisRecord {
        id: row.get(0)?,
        image_path: PathBuf::from(row.get::<_, String>(1)?),
        file_name: row.get(2)?,
        diagnosis,
        confidence: row.get(4)?,
        processing_time: row.get(5)?,
        model_used: row.get(6)?,
        analysis_date,
    })
}
