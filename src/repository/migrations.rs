//! Versioned database migrations.
//!
//! Migrations are an ordered list of `(version, sql)` pairs applied inside
//! a transaction and recorded in a `schema_migrations` table, so startup
//! is idempotent and the schema history stays explicit.

use std::collections::HashSet;

use rusqlite::Connection;
use tracing::info;

use super::{RepoError, Result};

/// All migrations, oldest first. Append-only; never edit a shipped entry.
static MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_initial_schema",
        r#"
CREATE TABLE robot_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    latitude REAL NOT NULL DEFAULT 0.0,
    longitude REAL NOT NULL DEFAULT 0.0,
    front_distance REAL NOT NULL DEFAULT 0.0,
    back_distance REAL NOT NULL DEFAULT 0.0,
    motion_detected INTEGER NOT NULL DEFAULT 0,
    battery_level REAL NOT NULL DEFAULT 0.0,
    status TEXT NOT NULL DEFAULT 'Unknown',
    gps_valid INTEGER NOT NULL DEFAULT 0,
    satellites INTEGER NOT NULL DEFAULT 0,
    altitude REAL NOT NULL DEFAULT 0.0,
    speed REAL NOT NULL DEFAULT 0.0,
    heading REAL NOT NULL DEFAULT 0.0,
    mq2_gas_level REAL NOT NULL DEFAULT 0.0,
    mq2_gas_detected INTEGER NOT NULL DEFAULT 0,
    mq135_air_quality REAL NOT NULL DEFAULT 0.0,
    mq135_alert_detected INTEGER NOT NULL DEFAULT 0,
    temperature REAL NOT NULL DEFAULT 0.0,
    orientation REAL NOT NULL DEFAULT 0.0,
    is_stable INTEGER NOT NULL DEFAULT 1,
    sound_detected INTEGER NOT NULL DEFAULT 0,
    distance_traveled REAL NOT NULL DEFAULT 0.0,
    search_pattern INTEGER NOT NULL DEFAULT 0,
    system_healthy INTEGER NOT NULL DEFAULT 1,
    current_state TEXT NOT NULL DEFAULT 'Unknown',
    methane_ppm REAL NOT NULL DEFAULT 0.0,
    hydrogen_ppm REAL NOT NULL DEFAULT 0.0,
    lpg_ppm REAL NOT NULL DEFAULT 0.0,
    smoke_ppm REAL NOT NULL DEFAULT 0.0,
    alcohol_ppm REAL NOT NULL DEFAULT 0.0,
    mq2_resistance REAL NOT NULL DEFAULT 0.0,
    emergency_mode INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE gas_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    mq2_level REAL NOT NULL DEFAULT 0.0,
    mq135_level REAL NOT NULL DEFAULT 0.0,
    latitude REAL NOT NULL DEFAULT 0.0,
    longitude REAL NOT NULL DEFAULT 0.0,
    alert_triggered INTEGER NOT NULL DEFAULT 0,
    alert_type TEXT NOT NULL DEFAULT 'normal',
    methane_ppm REAL NOT NULL DEFAULT 0.0,
    hydrogen_ppm REAL NOT NULL DEFAULT 0.0,
    lpg_ppm REAL NOT NULL DEFAULT 0.0,
    smoke_ppm REAL NOT NULL DEFAULT 0.0,
    alcohol_ppm REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE emergency_alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL DEFAULT '',
    latitude REAL NOT NULL DEFAULT 0.0,
    longitude REAL NOT NULL DEFAULT 0.0,
    acknowledged INTEGER NOT NULL DEFAULT 0,
    response_time TEXT
);

CREATE TABLE detections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    detection_type TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.0,
    latitude REAL NOT NULL DEFAULT 0.0,
    longitude REAL NOT NULL DEFAULT 0.0,
    file_path TEXT NOT NULL DEFAULT '',
    bbox_data TEXT NOT NULL DEFAULT 'null'
);

CREATE TABLE upload_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    file_name TEXT NOT NULL,
    file_type TEXT NOT NULL,
    detection_result TEXT NOT NULL DEFAULT '',
    confidence REAL NOT NULL DEFAULT 0.0
)
"#,
    ),
    (
        "0002_system_status",
        r#"
CREATE TABLE system_status (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    cpu_usage REAL NOT NULL DEFAULT 0.0,
    memory_usage REAL NOT NULL DEFAULT 0.0,
    disk_usage REAL NOT NULL DEFAULT 0.0,
    network_status TEXT NOT NULL DEFAULT 'connected',
    sensor_status TEXT NOT NULL DEFAULT 'operational',
    last_maintenance TEXT
)
"#,
    ),
    (
        "0003_timestamp_indexes",
        r#"
CREATE INDEX idx_robot_data_timestamp ON robot_data(timestamp);
CREATE INDEX idx_gas_history_timestamp ON gas_history(timestamp);
CREATE INDEX idx_gas_history_alert ON gas_history(alert_triggered);
CREATE INDEX idx_emergency_alerts_ack ON emergency_alerts(acknowledged);
CREATE INDEX idx_detections_timestamp ON detections(timestamp)
"#,
    ),
];

/// Run all pending migrations on the given connection.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY NOT NULL,
            run_on TEXT NOT NULL
        )",
        [],
    )?;

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut ran_count = 0;
    for (version, sql) in MIGRATIONS {
        if applied.contains(*version) {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql).map_err(|e| RepoError::Migration {
            version: version.to_string(),
            message: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, run_on) VALUES (?1, ?2)",
            rusqlite::params![version, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Applied migration: {}", version);
        ran_count += 1;
    }

    if ran_count == 0 {
        info!("No pending migrations");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn all_tables_exist_after_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        for table in [
            "robot_data",
            "gas_history",
            "emergency_alerts",
            "detections",
            "upload_history",
            "system_status",
        ] {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing table {table}");
        }
    }
}
