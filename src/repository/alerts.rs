//! Emergency alert repository.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::{connect, parse_datetime, parse_datetime_opt, Result};
use crate::models::{AlertSeverity, EmergencyAlert};

/// SQLite-backed emergency alert repository.
pub struct AlertRepository {
    db_path: PathBuf,
}

impl AlertRepository {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Insert an alert, returning its row ID.
    pub fn insert(&self, alert: &EmergencyAlert) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO emergency_alerts
            (timestamp, alert_type, severity, message, latitude, longitude, acknowledged)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                alert.timestamp.to_rfc3339(),
                alert.alert_type,
                alert.severity.as_str(),
                alert.message,
                alert.latitude,
                alert.longitude,
                alert.acknowledged,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get recent alerts, newest first, optionally filtered by
    /// acknowledgment state.
    pub fn recent(
        &self,
        limit: usize,
        acknowledged: Option<bool>,
    ) -> Result<Vec<EmergencyAlert>> {
        let conn = self.connect()?;

        let alerts = match acknowledged {
            Some(flag) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM emergency_alerts WHERE acknowledged = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![flag, limit as i64], map_alert)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM emergency_alerts
                     ORDER BY timestamp DESC, id DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit as i64], map_alert)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(alerts)
    }

    /// Acknowledge an alert, stamping the response time.
    ///
    /// Unknown IDs are a no-op; returns whether a row was updated.
    pub fn acknowledge(&self, alert_id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE emergency_alerts
             SET acknowledged = 1, response_time = ?1
             WHERE id = ?2 AND acknowledged = 0",
            params![Utc::now().to_rfc3339(), alert_id],
        )?;
        Ok(rows > 0)
    }

    /// Number of unacknowledged alerts.
    pub fn unacknowledged_count(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM emergency_alerts WHERE acknowledged = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_alert(row: &Row<'_>) -> rusqlite::Result<EmergencyAlert> {
    Ok(EmergencyAlert {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        alert_type: row.get("alert_type")?,
        severity: AlertSeverity::from_str(&row.get::<_, String>("severity")?)
            .unwrap_or(AlertSeverity::High),
        message: row.get("message")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        acknowledged: row.get("acknowledged")?,
        response_time: parse_datetime_opt(row.get::<_, Option<String>>("response_time")?),
    })
}
