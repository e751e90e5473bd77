//! Database schema.

use rusqlite::{Connection, params};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{format_timestamp, parse_timestamp};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
///
/// Safe to call on every open: tables are created only if missing and no
/// row is ever dropped. Databases created by the earlier desktop client
/// (which has the `analysis_records` table but no version table) are
/// adopted as version 1, and their zone-less `analysis_date` values are
/// rewritten in the canonical UTC encoding so range filters stay exact.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    if version < SCHEMA_VERSION {
        debug!("Creating schema v{} (found v{})", SCHEMA_VERSION, version);
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    normalize_dates(conn)?;

    Ok(())
}

/// Length of a canonical `analysis_date` value, `YYYY-MM-DDTHH:MM:SS.fffffffffZ`.
const CANONICAL_DATE_LEN: i64 = 30;

/// Rewrite `analysis_date` values that are not in the canonical encoding.
///
/// Values that cannot be parsed are left alone and reported when read.
fn normalize_dates(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, analysis_date FROM analysis_records
         WHERE length(analysis_date) != ?1 OR substr(analysis_date, -1) != 'Z'",
    )?;
    let stale = stmt
        .query_map([CANONICAL_DATE_LEN], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    drop(stmt);

    if stale.is_empty() {
        return Ok(());
    }

    let mut rewritten = 0;
    for (id, raw) in stale {
        match parse_timestamp(&raw).and_then(format_timestamp) {
            Ok(canonical) => {
                conn.execute(
                    "UPDATE analysis_records SET analysis_date = ?1 WHERE id = ?2",
                    params![canonical, id],
                )?;
                rewritten += 1;
            }
            Err(e) => warn!("Leaving analysis_date of record {} as is: {}", id, e),
        }
    }

    debug!("Normalized {} analysis_date values", rewritten);
    Ok(())
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if the schema_version table exists
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- One row per completed classification
        CREATE TABLE IF NOT EXISTS analysis_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            image_path TEXT NOT NULL,
            file_name TEXT NOT NULL,
            diagnosis TEXT NOT NULL
                CHECK (diagnosis IN ('parasitized', 'uninfected', 'error')),
            confidence REAL NOT NULL,
            processing_time REAL NOT NULL,
            model_used TEXT NOT NULL,
            analysis_date TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_analysis_records_date
            ON analysis_records(analysis_date);
        CREATE INDEX IF NOT EXISTS idx_analysis_records_diagnosis
            ON analysis_records(diagnosis);
        "#,
    )?;

    Ok(())
}
