//! Telemetry repository: sensor readings and the gas-history log.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, Row};

use super::{connect, parse_datetime, to_option, Result};
use crate::models::{EmergencyAlert, GasAlertLevel, GasEvent, RobotReading};

/// What the ingestion transaction wrote, beyond the reading itself.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading_id: i64,
    /// Gas-history classification, if the reading was significant.
    pub gas_event: Option<GasAlertLevel>,
    /// Emergency alert row ID, if the reading was in emergency mode.
    pub emergency_alert_id: Option<i64>,
}

/// SQLite-backed telemetry repository.
pub struct TelemetryRepository {
    db_path: PathBuf,
}

impl TelemetryRepository {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Store a reading together with its derived rows.
    ///
    /// The reading, the gas-history entry, and the emergency alert are one
    /// logical unit and are committed in a single transaction.
    pub fn ingest(&self, reading: &RobotReading) -> Result<IngestOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO robot_data
            (timestamp, latitude, longitude, front_distance, back_distance,
             motion_detected, battery_level, status,
             gps_valid, satellites, altitude, speed, heading,
             mq2_gas_level, mq2_gas_detected, mq135_air_quality, mq135_alert_detected,
             temperature, orientation, is_stable, sound_detected,
             distance_traveled, search_pattern, system_healthy, current_state,
             methane_ppm, hydrogen_ppm, lpg_ppm, smoke_ppm, alcohol_ppm,
             mq2_resistance, emergency_mode)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28,
                    ?29, ?30, ?31, ?32)
            "#,
            params![
                reading.timestamp.to_rfc3339(),
                reading.latitude,
                reading.longitude,
                reading.front_distance,
                reading.back_distance,
                reading.motion_detected,
                reading.battery_level,
                reading.status,
                reading.gps_valid,
                reading.satellites,
                reading.altitude,
                reading.speed,
                reading.heading,
                reading.mq2_gas_level,
                reading.mq2_gas_detected,
                reading.mq135_air_quality,
                reading.mq135_alert_detected,
                reading.temperature,
                reading.orientation,
                reading.is_stable,
                reading.sound_detected,
                reading.distance_traveled,
                reading.search_pattern,
                reading.system_healthy,
                reading.current_state,
                reading.methane_ppm,
                reading.hydrogen_ppm,
                reading.lpg_ppm,
                reading.smoke_ppm,
                reading.alcohol_ppm,
                reading.mq2_resistance,
                reading.emergency_mode,
            ],
        )?;
        let reading_id = tx.last_insert_rowid();

        let mut gas_event = None;
        if GasEvent::is_significant(reading) {
            let event = GasEvent::from_reading(reading);
            tx.execute(
                r#"
                INSERT INTO gas_history
                (timestamp, mq2_level, mq135_level, latitude, longitude,
                 alert_triggered, alert_type,
                 methane_ppm, hydrogen_ppm, lpg_ppm, smoke_ppm, alcohol_ppm)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    event.timestamp.to_rfc3339(),
                    event.mq2_level,
                    event.mq135_level,
                    event.latitude,
                    event.longitude,
                    event.alert_triggered,
                    event.alert_type.as_str(),
                    event.methane_ppm,
                    event.hydrogen_ppm,
                    event.lpg_ppm,
                    event.smoke_ppm,
                    event.alcohol_ppm,
                ],
            )?;
            gas_event = Some(event.alert_type);
        }

        let mut emergency_alert_id = None;
        if reading.emergency_mode {
            let alert = EmergencyAlert::from_reading(reading);
            tx.execute(
                r#"
                INSERT INTO emergency_alerts
                (timestamp, alert_type, severity, message, latitude, longitude, acknowledged)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
                "#,
                params![
                    alert.timestamp.to_rfc3339(),
                    alert.alert_type,
                    alert.severity.as_str(),
                    alert.message,
                    alert.latitude,
                    alert.longitude,
                ],
            )?;
            emergency_alert_id = Some(tx.last_insert_rowid());
        }

        tx.commit()?;

        Ok(IngestOutcome {
            reading_id,
            gas_event,
            emergency_alert_id,
        })
    }

    /// Get the most recent readings, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<RobotReading>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM robot_data ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;

        let readings = stmt
            .query_map(params![limit as i64], map_reading)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(readings)
    }

    /// Get the single latest reading, if any.
    pub fn latest(&self) -> Result<Option<RobotReading>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM robot_data ORDER BY timestamp DESC, id DESC LIMIT 1",
        )?;
        to_option(stmt.query_row([], map_reading))
    }

    /// Total number of stored readings.
    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM robot_data", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get gas-history entries from the last `hours` hours, newest first.
    pub fn gas_history(&self, limit: usize, hours: i64) -> Result<Vec<GasEvent>> {
        let cutoff = (Utc::now() - Duration::hours(hours)).to_rfc3339();
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM gas_history WHERE timestamp > ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )?;

        let events = stmt
            .query_map(params![cutoff, limit as i64], map_gas_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Get gas-history entries that triggered an alert, newest first.
    pub fn gas_alerts(&self, limit: usize) -> Result<Vec<GasEvent>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM gas_history WHERE alert_triggered = 1
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;

        let events = stmt
            .query_map(params![limit as i64], map_gas_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }
}

fn map_reading(row: &Row<'_>) -> rusqlite::Result<RobotReading> {
    Ok(RobotReading {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        front_distance: row.get("front_distance")?,
        back_distance: row.get("back_distance")?,
        motion_detected: row.get("motion_detected")?,
        battery_level: row.get("battery_level")?,
        status: row.get("status")?,
        gps_valid: row.get("gps_valid")?,
        satellites: row.get("satellites")?,
        altitude: row.get("altitude")?,
        speed: row.get("speed")?,
        heading: row.get("heading")?,
        mq2_gas_level: row.get("mq2_gas_level")?,
        mq2_gas_detected: row.get("mq2_gas_detected")?,
        mq135_air_quality: row.get("mq135_air_quality")?,
        mq135_alert_detected: row.get("mq135_alert_detected")?,
        temperature: row.get("temperature")?,
        orientation: row.get("orientation")?,
        is_stable: row.get("is_stable")?,
        sound_detected: row.get("sound_detected")?,
        distance_traveled: row.get("distance_traveled")?,
        search_pattern: row.get("search_pattern")?,
        system_healthy: row.get("system_healthy")?,
        current_state: row.get("current_state")?,
        methane_ppm: row.get("methane_ppm")?,
        hydrogen_ppm: row.get("hydrogen_ppm")?,
        lpg_ppm: row.get("lpg_ppm")?,
        smoke_ppm: row.get("smoke_ppm")?,
        alcohol_ppm: row.get("alcohol_ppm")?,
        mq2_resistance: row.get("mq2_resistance")?,
        emergency_mode: row.get("emergency_mode")?,
    })
}

fn map_gas_event(row: &Row<'_>) -> rusqlite::Result<GasEvent> {
    Ok(GasEvent {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        mq2_level: row.get("mq2_level")?,
        mq135_level: row.get("mq135_level")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        alert_triggered: row.get("alert_triggered")?,
        alert_type: GasAlertLevel::from_str(&row.get::<_, String>("alert_type")?)
            .unwrap_or(GasAlertLevel::Normal),
        methane_ppm: row.get("methane_ppm")?,
        hydrogen_ppm: row.get("hydrogen_ppm")?,
        lpg_ppm: row.get("lpg_ppm")?,
        smoke_ppm: row.get("smoke_ppm")?,
        alcohol_ppm: row.get("alcohol_ppm")?,
    })
}
