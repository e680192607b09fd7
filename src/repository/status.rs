//! System status repository.

use std::path::PathBuf;

use rusqlite::{params, Connection, Row};

use super::{connect, parse_datetime, parse_datetime_opt, Result};
use crate::models::SystemStatusEntry;

/// SQLite-backed system status log.
pub struct StatusRepository {
    db_path: PathBuf,
}

impl StatusRepository {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Append a status snapshot.
    pub fn log(&self, entry: &SystemStatusEntry) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO system_status
            (timestamp, cpu_usage, memory_usage, disk_usage, network_status,
             sensor_status, last_maintenance)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.timestamp.to_rfc3339(),
                entry.cpu_usage,
                entry.memory_usage,
                entry.disk_usage,
                entry.network_status,
                entry.sensor_status,
                entry.last_maintenance.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get recent snapshots, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SystemStatusEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM system_status ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit as i64], map_status)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

fn map_status(row: &Row<'_>) -> rusqlite::Result<SystemStatusEntry> {
    Ok(SystemStatusEntry {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        cpu_usage: row.get("cpu_usage")?,
        memory_usage: row.get("memory_usage")?,
        disk_usage: row.get("disk_usage")?,
        network_status: row.get("network_status")?,
        sensor_status: row.get("sensor_status")?,
        last_maintenance: parse_datetime_opt(
            row.get::<_, Option<String>>("last_maintenance")?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Database;
    use tempfile::tempdir;

    #[test]
    fn status_log_round_trip() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        let repo = db.status();

        let entry = SystemStatusEntry {
            cpu_usage: 12.5,
            ..Default::default()
        };
        repo.log(&entry).unwrap();

        let recent = repo.recent(5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].cpu_usage, 12.5);
        assert_eq!(recent[0].network_status, "connected");
        assert!(recent[0].last_maintenance.is_none());
    }
}
