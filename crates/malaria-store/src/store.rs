//! Main store implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use time::OffsetDateTime;
use tracing::{debug, info};

use malaria_types::{AnalysisRecord, Diagnosis};

use crate::error::{Error, Result};
use crate::models::{RECORD_COLUMNS, format_timestamp, record_from_row};
use crate::queries::AnalysisQuery;
use crate::schema;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Location {
    File(PathBuf),
    /// Shared-cache in-memory database. The keepalive connection holds the
    /// database open between per-operation connections.
    Memory {
        uri: String,
        _keepalive: Mutex<Connection>,
    },
}

/// SQLite-backed store for analysis records.
///
/// The store does not hold a long-lived connection: every operation opens
/// its own connection, runs its statement(s), and closes it again. A
/// `Store` value only exists once the schema has been initialized, so
/// every method can assume the table is present.
pub struct Store {
    location: Location,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Location::File(path) => f.debug_struct("Store").field("path", path).finish(),
            Location::Memory { uri, .. } => f.debug_struct("Store").field("uri", uri).finish(),
        }
    }
}

impl Store {
    /// Open or create a database at the given path.
    ///
    /// Parent directories are created if needed and the schema is
    /// initialized. Existing rows are never touched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let store = Self {
            location: Location::File(path.to_path_buf()),
        };

        let conn = store.connect()?;
        // journal_mode is persistent, so setting it once here is enough
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode: {}", mode);
        schema::initialize(&conn)?;

        Ok(store)
    }

    /// Open the default database location (see [`crate::default_db_path`]).
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path()?)
    }

    /// Open a private in-memory database.
    ///
    /// Each call gets its own database, which lives as long as the returned
    /// `Store`. Useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let uri = format!(
            "file:malaria-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        let keepalive = Connection::open_with_flags(&uri, Self::open_flags())?;
        schema::initialize(&keepalive)?;

        Ok(Self {
            location: Location::Memory {
                uri,
                _keepalive: Mutex::new(keepalive),
            },
        })
    }

    /// Re-run schema initialization.
    ///
    /// Idempotent: tables and indexes are created only if missing.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        schema::initialize(&conn)
    }

    /// Path of the database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory { .. } => None,
        }
    }

    fn open_flags() -> OpenFlags {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }

    /// Open a connection scoped to a single operation.
    fn connect(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => Connection::open_with_flags(path, Self::open_flags())?,
            Location::Memory { uri, .. } => Connection::open_with_flags(uri, Self::open_flags())?,
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

// Record operations
impl Store {
    /// Insert a record and return its assigned id.
    ///
    /// The record's own `id` is ignored. The insert is a single statement,
    /// so a failed insert leaves no partial row behind.
    pub fn insert(&self, record: &AnalysisRecord) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO analysis_records
                (image_path, file_name, diagnosis, confidence, processing_time, model_used, analysis_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.image_path.to_string_lossy(),
                &record.file_name,
                record.diagnosis.as_str(),
                record.confidence,
                record.processing_time,
                &record.model_used,
                format_timestamp(record.analysis_date)?,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(
            "Saved analysis {} ({}, {})",
            id, record.file_name, record.diagnosis
        );
        Ok(id)
    }

    /// Get a single record by id.
    pub fn get(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        let conn = self.connect()?;
        let sql = format!("SELECT {} FROM analysis_records WHERE id = ?", RECORD_COLUMNS);

        let record = conn.query_row(&sql, [id], record_from_row).optional()?;
        Ok(record)
    }

    /// All records, newest first.
    pub fn get_all(&self) -> Result<Vec<AnalysisRecord>> {
        self.query(&AnalysisQuery::new())
    }

    /// Records matching every provided filter, newest first.
    ///
    /// `since` and `until` are inclusive bounds on `analysis_date`. With no
    /// filters this is the same as [`Store::get_all`].
    pub fn get_filtered(
        &self,
        diagnosis: Option<Diagnosis>,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<Vec<AnalysisRecord>> {
        let mut query = AnalysisQuery::new().maybe_diagnosis(diagnosis);
        query.since = since;
        query.until = until;
        self.query(&query)
    }

    /// Query records with filters.
    pub fn query(&self, query: &AnalysisQuery) -> Result<Vec<AnalysisRecord>> {
        let (where_clause, params) = query.build_where()?;
        let sql = query.build_sql(&where_clause);

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_ref.as_slice(), record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Count records, optionally only those with the given diagnosis.
    pub fn count(&self, diagnosis: Option<Diagnosis>) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = match diagnosis {
            Some(diagnosis) => conn.query_row(
                "SELECT COUNT(*) FROM analysis_records WHERE diagnosis = ?",
                [diagnosis.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM analysis_records", [], |row| {
                row.get(0)
            })?,
        };

        Ok(count as u64)
    }
}
