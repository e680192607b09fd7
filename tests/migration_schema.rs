//! Migration schema tests.
//!
//! Verifies that the versioned migrations produce the expected tables,
//! columns and indexes, inspected through SQLite PRAGMAs.

use std::collections::BTreeMap;

use rusqlite::{Connection, Result as SqliteResult};

use roverwatch::repository::migrations::run_migrations;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    name: String,
    col_type: String,
    not_null: bool,
    primary_key: bool,
}

/// Extract column info for a table.
fn extract_columns(conn: &Connection, table: &str) -> SqliteResult<BTreeMap<String, ColumnInfo>> {
    let mut columns = BTreeMap::new();

    let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let column_iter = pragma.query_map([], |row| {
        Ok(ColumnInfo {
            name: row.get(1)?,
            col_type: row.get::<_, String>(2)?.to_uppercase(),
            not_null: row.get(3)?,
            primary_key: row.get::<_, i32>(5)? > 0,
        })
    })?;

    for col in column_iter {
        let col = col?;
        columns.insert(col.name.clone(), col);
    }

    Ok(columns)
}

fn table_names(conn: &Connection) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?.collect();
    rows
}

fn index_names(conn: &Connection) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='index' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?.collect();
    rows
}

fn migrated_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    run_migrations(&mut conn).unwrap();
    conn
}

#[test]
fn migrations_create_all_tables() {
    let conn = migrated_connection();
    let tables = table_names(&conn).unwrap();

    for expected in [
        "detections",
        "emergency_alerts",
        "gas_history",
        "robot_data",
        "schema_migrations",
        "system_status",
        "upload_history",
    ] {
        assert!(tables.contains(&expected.to_string()), "missing {expected}");
    }
}

#[test]
fn robot_data_has_full_sensor_schema() {
    let conn = migrated_connection();
    let columns = extract_columns(&conn, "robot_data").unwrap();

    assert!(columns["id"].primary_key);
    assert!(columns["timestamp"].not_null);

    for real_col in [
        "latitude",
        "longitude",
        "front_distance",
        "back_distance",
        "battery_level",
        "altitude",
        "speed",
        "heading",
        "mq2_gas_level",
        "mq135_air_quality",
        "temperature",
        "orientation",
        "distance_traveled",
        "methane_ppm",
        "hydrogen_ppm",
        "lpg_ppm",
        "smoke_ppm",
        "alcohol_ppm",
        "mq2_resistance",
    ] {
        assert_eq!(columns[real_col].col_type, "REAL", "column {real_col}");
    }

    for int_col in [
        "motion_detected",
        "gps_valid",
        "satellites",
        "mq2_gas_detected",
        "mq135_alert_detected",
        "is_stable",
        "sound_detected",
        "search_pattern",
        "system_healthy",
        "emergency_mode",
    ] {
        assert_eq!(columns[int_col].col_type, "INTEGER", "column {int_col}");
    }

    for text_col in ["status", "current_state"] {
        assert_eq!(columns[text_col].col_type, "TEXT", "column {text_col}");
    }
}

#[test]
fn emergency_alerts_response_time_is_nullable() {
    let conn = migrated_connection();
    let columns = extract_columns(&conn, "emergency_alerts").unwrap();

    assert!(!columns["response_time"].not_null);
    assert!(columns["acknowledged"].not_null);
    assert_eq!(columns["severity"].col_type, "TEXT");
}

#[test]
fn gas_history_defaults_to_normal() {
    let conn = migrated_connection();

    conn.execute(
        "INSERT INTO gas_history (timestamp, mq2_level, mq135_level, latitude, longitude)
         VALUES ('2026-01-01T00:00:00+00:00', 25.0, 110.0, 0.0, 0.0)",
        [],
    )
    .unwrap();

    let (triggered, alert_type): (bool, String) = conn
        .query_row(
            "SELECT alert_triggered, alert_type FROM gas_history",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert!(!triggered);
    assert_eq!(alert_type, "normal");
}

#[test]
fn timestamp_indexes_exist() {
    let conn = migrated_connection();
    let indexes = index_names(&conn).unwrap();

    for expected in [
        "idx_robot_data_timestamp",
        "idx_gas_history_timestamp",
        "idx_gas_history_alert",
        "idx_emergency_alerts_ack",
        "idx_detections_timestamp",
    ] {
        assert!(indexes.contains(&expected.to_string()), "missing {expected}");
    }
}

#[test]
fn schema_migrations_records_every_version() {
    let conn = migrated_connection();

    let versions: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<SqliteResult<_>>()
            .unwrap()
    };

    assert_eq!(
        versions,
        vec![
            "0001_initial_schema",
            "0002_system_status",
            "0003_timestamp_indexes"
        ]
    );
}
