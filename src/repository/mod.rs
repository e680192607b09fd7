//! Repository layer for SQLite persistence.
//!
//! Each repository holds the database path and opens a scoped connection
//! per logical operation. Rows are mapped to named-field model structs;
//! column access is always by name, never by position.

pub mod alerts;
pub mod detections;
pub mod migrations;
pub mod status;
pub mod telemetry;

pub use alerts::AlertRepository;
pub use detections::DetectionRepository;
pub use status::StatusRepository;
pub use telemetry::{IngestOutcome, TelemetryRepository};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// Errors that can occur in the repository layer.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration {version} failed: {message}")]
    Migration { version: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// Open a connection with the standard pragmas applied.
pub(crate) fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Convert a no-rows query result into `None`.
pub(crate) fn to_option<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Handle to the telemetry database; constructs per-aggregate repositories.
#[derive(Clone)]
pub struct Database {
    db_path: PathBuf,
}

impl Database {
    /// Open the database, creating it and running pending migrations.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = connect(db_path)?;
        migrations::run_migrations(&mut conn)?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn telemetry(&self) -> TelemetryRepository {
        TelemetryRepository::new(self.db_path.clone())
    }

    pub fn alerts(&self) -> AlertRepository {
        AlertRepository::new(self.db_path.clone())
    }

    pub fn detections(&self) -> DetectionRepository {
        DetectionRepository::new(self.db_path.clone())
    }

    pub fn status(&self) -> StatusRepository {
        StatusRepository::new(self.db_path.clone())
    }
}
