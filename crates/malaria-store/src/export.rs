//! History export.

use malaria_types::AnalysisRecord;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};
use crate::queries::AnalysisQuery;
use crate::store::Store;

/// Column order of [`Store::export_csv`].
pub const CSV_HEADER: [&str; 8] = [
    "id",
    "analysis_date",
    "file_name",
    "image_path",
    "diagnosis",
    "confidence",
    "processing_time",
    "model_used",
];

/// Write `records` as CSV in [`CSV_HEADER`] column order.
///
/// Dates are RFC 3339 in UTC. The header row is optional so that callers
/// can append to existing output.
pub fn records_to_csv(records: &[AnalysisRecord], header: bool) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if header {
        writer.write_record(CSV_HEADER)?;
    }

    for record in records {
        let date = record
            .analysis_date
            .format(&Rfc3339)
            .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;

        writer.write_record([
            record.id.to_string(),
            date,
            record.file_name.clone(),
            record.image_path.to_string_lossy().into_owned(),
            record.diagnosis.as_str().to_string(),
            record.confidence.to_string(),
            record.processing_time.to_string(),
            record.model_used.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl Store {
    /// Export the records matching `query` as CSV, header included.
    pub fn export_csv(&self, query: &AnalysisQuery) -> Result<String> {
        records_to_csv(&self.query(query)?, true)
    }

    /// Export the records matching `query` as a pretty-printed JSON array.
    pub fn export_json(&self, query: &AnalysisQuery) -> Result<String> {
        let records = self.query(query)?;
        Ok(serde_json::to_string_pretty(&records)?)
    }
}
