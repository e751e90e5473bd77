//! Local analysis history for the malaria cell classifier client.
//!
//! This crate provides SQLite-based storage for completed analyses, so past
//! results can be browsed and filtered without contacting the inference
//! service again.
//!
//! # Features
//!
//! - Create-if-missing schema, safe to initialize repeatedly
//! - Insert-only records with store-assigned, never reused ids
//! - Query by diagnosis and inclusive date range, newest first, with pagination
//! - CSV and JSON export
//!
//! Every operation opens and closes its own connection, so a [`Store`] can be
//! shared freely between callers.
//!
//! # Example
//!
//! ```no_run
//! use malaria_store::{AnalysisQuery, Store};
//! use malaria_types::Diagnosis;
//!
//! let store = Store::open_default()?;
//!
//! let query = AnalysisQuery::new()
//!     .diagnosis(Diagnosis::Parasitized)
//!     .limit(10);
//! let records = store.query(&query)?;
//! # Ok::<(), malaria_store::Error>(())
//! ```

mod error;
mod export;
mod models;
mod queries;
mod schema;
mod store;

use std::path::PathBuf;

pub use error::{Error, Result};
pub use export::{CSV_HEADER, records_to_csv};
pub use queries::AnalysisQuery;
pub use schema::SCHEMA_VERSION;
pub use store::Store;

/// Directory name under the user's home directory.
pub const APP_DIR: &str = ".malaria-detection";

/// Database file name inside [`APP_DIR`].
pub const DB_FILE: &str = "malaria_analyses.db";

/// Default database path: `<home>/.malaria-detection/malaria_analyses.db`.
///
/// The same location on every platform, shared with the earlier desktop
/// client.
pub fn default_db_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR).join(DB_FILE))
        .ok_or(Error::NoHomeDirectory)
}
