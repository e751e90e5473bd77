//! Read/write facade over the analysis store.
//!
//! [`AnalysisHistory`] is what display code talks to. It relays filter
//! choices to the [`Store`] and never fails: a read that goes wrong is
//! logged and shows up as an empty list, a failed save as `None`.

use time::macros::time;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use tracing::{error, warn};

use malaria_store::{AnalysisQuery, Store};
use malaria_types::{AnalysisRecord, Diagnosis};

/// Non-failing access to analysis history.
#[derive(Debug)]
pub struct AnalysisHistory {
    store: Store,
}

impl AnalysisHistory {
    /// Wrap an opened store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The underlying store, for callers that want errors.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Every record, newest first.
    pub fn all(&self) -> Vec<AnalysisRecord> {
        self.store.get_all().unwrap_or_else(|e| {
            warn!("Failed to load analysis history: {}", e);
            Vec::new()
        })
    }

    /// Records with the given diagnosis, or every record for `None`.
    pub fn filter(&self, diagnosis: Option<Diagnosis>) -> Vec<AnalysisRecord> {
        match diagnosis {
            Some(diagnosis) => self.filtered(Some(diagnosis), None, None),
            None => self.all(),
        }
    }

    /// Records matching every provided filter, newest first.
    pub fn filtered(
        &self,
        diagnosis: Option<Diagnosis>,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Vec<AnalysisRecord> {
        self.store
            .get_filtered(diagnosis, since, until)
            .unwrap_or_else(|e| {
                warn!("Failed to filter analysis history: {}", e);
                Vec::new()
            })
    }

    /// Records analysed on or between two calendar days (UTC).
    ///
    /// Either bound may be omitted. `start` covers its whole day from
    /// midnight, `end` up to its last nanosecond.
    pub fn between_dates(
        &self,
        diagnosis: Option<Diagnosis>,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Vec<AnalysisRecord> {
        let since = start.map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT).assume_utc());
        let until = end.map(|d| PrimitiveDateTime::new(d, time!(23:59:59.999999999)).assume_utc());
        self.filtered(diagnosis, since, until)
    }

    /// Run an arbitrary query (pagination, ordering).
    pub fn query(&self, query: &AnalysisQuery) -> Vec<AnalysisRecord> {
        self.store.query(query).unwrap_or_else(|e| {
            warn!("Failed to query analysis history: {}", e);
            Vec::new()
        })
    }

    /// Number of stored records, 0 if the store cannot be read.
    pub fn count(&self, diagnosis: Option<Diagnosis>) -> u64 {
        self.store.count(diagnosis).unwrap_or_else(|e| {
            warn!("Failed to count analysis history: {}", e);
            0
        })
    }

    /// Save a record, returning its id, or `None` if it could not be saved.
    pub fn record(&self, record: &AnalysisRecord) -> Option<i64> {
        match self.store.insert(record) {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Could not save analysis of {}: {}", record.file_name, e);
                None
            }
        }
    }
}

impl From<Store> for AnalysisHistory {
    fn from(store: Store) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use malaria_types::DEFAULT_MODEL;
    use time::macros::{date, datetime};

    fn record(diagnosis: Diagnosis, date: OffsetDateTime) -> AnalysisRecord {
        AnalysisRecord::new("/img/cell.png", diagnosis, 0.5, 0.3, DEFAULT_MODEL)
            .with_analysis_date(date)
    }

    fn ids(records: &[AnalysisRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn history() -> AnalysisHistory {
        AnalysisHistory::new(Store::open_in_memory().unwrap())
    }

    /// A file-backed history whose database file has been clobbered.
    fn broken_history(dir: &tempfile::TempDir) -> AnalysisHistory {
        let path = dir.path().join("broken.db");
        let store = Store::open(&path).unwrap();

        std::fs::write(&path, b"this is not a database").unwrap();
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));

        AnalysisHistory::new(store)
    }

    #[test]
    fn test_empty_history() {
        let history = history();
        assert!(history.all().is_empty());
        assert!(history.filter(Some(Diagnosis::Parasitized)).is_empty());
        assert_eq!(history.count(None), 0);
    }

    #[test]
    fn test_record_and_list_newest_first() {
        let history = history();
        let first = history
            .record(&record(Diagnosis::Parasitized, datetime!(2026-01-01 10:00 UTC)))
            .unwrap();
        let second = history
            .record(&record(Diagnosis::Uninfected, datetime!(2026-01-02 10:00 UTC)))
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(ids(&history.all()), vec![2, 1]);
        assert_eq!(ids(&history.filter(Some(Diagnosis::Uninfected))), vec![2]);
        assert_eq!(ids(&history.filter(None)), vec![2, 1]);
    }

    #[test]
    fn test_between_dates_covers_whole_days() {
        let history = history();
        for date in [
            datetime!(2026-03-09 23:59:59.999 UTC),
            datetime!(2026-03-10 00:00:00 UTC),
            datetime!(2026-03-11 23:59:59.999999999 UTC),
            datetime!(2026-03-12 00:00:00 UTC),
        ] {
            history.record(&record(Diagnosis::Uninfected, date)).unwrap();
        }

        let found = history.between_dates(None, Some(date!(2026-03-10)), Some(date!(2026-03-11)));
        assert_eq!(ids(&found), vec![3, 2]);

        let same_day = history.between_dates(None, Some(date!(2026-03-12)), Some(date!(2026-03-12)));
        assert_eq!(ids(&same_day), vec![4]);

        let open_start = history.between_dates(None, None, Some(date!(2026-03-09)));
        assert_eq!(ids(&open_start), vec![1]);
    }

    #[test]
    fn test_between_dates_with_diagnosis() {
        let history = history();
        history
            .record(&record(Diagnosis::Parasitized, datetime!(2026-05-05 12:00 UTC)))
            .unwrap();
        history
            .record(&record(Diagnosis::Uninfected, datetime!(2026-05-05 13:00 UTC)))
            .unwrap();

        let found = history.between_dates(
            Some(Diagnosis::Parasitized),
            Some(date!(2026-05-05)),
            Some(date!(2026-05-05)),
        );
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn test_read_failure_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = broken_history(&dir);

        assert!(history.all().is_empty());
        assert!(history.filter(Some(Diagnosis::Error)).is_empty());
        assert!(history.query(&AnalysisQuery::new().limit(5)).is_empty());
        assert_eq!(history.count(None), 0);
    }

    #[test]
    fn test_insert_failure_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let history = broken_history(&dir);

        let saved = history.record(&record(Diagnosis::Parasitized, datetime!(2026-01-01 00:00 UTC)));
        assert_eq!(saved, None);
    }
}
