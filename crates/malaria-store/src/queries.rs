//! Query builder for analysis history.
//!
//! [`AnalysisQuery`] follows the builder pattern: every filter is optional,
//! filters combine with AND, and results come back newest first unless
//! [`AnalysisQuery::oldest_first`] is called.
//!
//! # Example
//!
//! ```
//! use malaria_store::{AnalysisQuery, Store};
//! use malaria_types::Diagnosis;
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let last_week = OffsetDateTime::now_utc() - Duration::days(7);
//!
//! let query = AnalysisQuery::new()
//!     .diagnosis(Diagnosis::Parasitized)
//!     .since(last_week)
//!     .limit(20);
//!
//! let records = store.query(&query)?;
//! assert!(records.is_empty());
//! # Ok::<(), malaria_store::Error>(())
//! ```

use time::OffsetDateTime;

use malaria_types::Diagnosis;

use crate::error::Result;
use crate::models::{RECORD_COLUMNS, format_timestamp};

/// Fluent query builder for analysis records.
///
/// Use this with [`Store::query`](crate::Store::query),
/// [`Store::export_csv`](crate::Store::export_csv) and
/// [`Store::export_json`](crate::Store::export_json).
///
/// Ordering is by `id`, which the store assigns in insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnalysisQuery {
    /// Only records with this diagnosis.
    pub diagnosis: Option<Diagnosis>,
    /// Only records analysed at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Only records analysed at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Number of results to skip for pagination.
    pub offset: Option<u32>,
    /// If true, newest first (`id DESC`). Default from `new()`: true.
    pub newest_first: bool,
}

impl AnalysisQuery {
    /// Create a new query with default settings.
    ///
    /// Default behavior:
    /// - No diagnosis filter
    /// - No date range filter
    /// - No limit
    /// - Ordered by newest first
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter by diagnosis.
    pub fn diagnosis(mut self, diagnosis: Diagnosis) -> Self {
        self.diagnosis = Some(diagnosis);
        self
    }

    /// Set or clear the diagnosis filter.
    pub fn maybe_diagnosis(mut self, diagnosis: Option<Diagnosis>) -> Self {
        self.diagnosis = diagnosis;
        self
    }

    /// Filter to records analysed at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to records analysed at or before this time.
    ///
    /// Use with `since()` for an inclusive range.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    ///
    /// SQLite only accepts OFFSET after LIMIT, so an offset without a
    /// limit is emitted as `LIMIT -1 OFFSET n`.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first (ascending `id`).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// True if no row-restricting filter is set.
    pub fn is_unfiltered(&self) -> bool {
        self.diagnosis.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.limit.is_none()
            && self.offset.is_none()
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> Result<(String, Vec<Box<dyn rusqlite::ToSql>>)> {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(diagnosis) = self.diagnosis {
            conditions.push("diagnosis = ?");
            params.push(Box::new(diagnosis.as_str()));
        }

        if let Some(since) = self.since {
            conditions.push("analysis_date >= ?");
            params.push(Box::new(format_timestamp(since)?));
        }

        if let Some(until) = self.until {
            conditions.push("analysis_date <= ?");
            params.push(Box::new(format_timestamp(until)?));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Ok((where_clause, params))
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self, where_clause: &str) -> String {
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT {} FROM analysis_records {} ORDER BY id {}",
            RECORD_COLUMNS, where_clause, order
        );

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        sql
    }
}
