//! Detection and upload-history repository.

use std::path::PathBuf;

use rusqlite::{params, Connection, Row};

use super::{connect, parse_datetime, Result};
use crate::models::{Detection, MediaKind, UploadRecord};

/// SQLite-backed detection and upload-history repository.
pub struct DetectionRepository {
    db_path: PathBuf,
}

impl DetectionRepository {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Insert a detection, returning its row ID.
    pub fn insert(&self, detection: &Detection) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO detections
            (timestamp, detection_type, confidence, latitude, longitude, file_path, bbox_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                detection.timestamp.to_rfc3339(),
                detection.detection_type,
                detection.confidence,
                detection.latitude,
                detection.longitude,
                detection.file_path,
                detection.bbox_data.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get the most recent detections, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Detection>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM detections ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;

        let detections = stmt
            .query_map(params![limit as i64], map_detection)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(detections)
    }

    /// Insert an upload-history record, returning its row ID.
    pub fn insert_upload(&self, record: &UploadRecord) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO upload_history
            (timestamp, file_name, file_type, detection_result, confidence)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.timestamp.to_rfc3339(),
                record.file_name,
                record.file_type.as_str(),
                record.detection_result,
                record.confidence,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get the most recent upload records, newest first.
    pub fn upload_history(&self, limit: usize) -> Result<Vec<UploadRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM upload_history ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], map_upload)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn map_detection(row: &Row<'_>) -> rusqlite::Result<Detection> {
    let bbox_raw: String = row.get("bbox_data")?;
    Ok(Detection {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        detection_type: row.get("detection_type")?,
        confidence: row.get("confidence")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        file_path: row.get("file_path")?,
        bbox_data: serde_json::from_str(&bbox_raw).unwrap_or(serde_json::Value::Null),
    })
}

fn map_upload(row: &Row<'_>) -> rusqlite::Result<UploadRecord> {
    Ok(UploadRecord {
        id: row.get("id")?,
        timestamp: parse_datetime(&row.get::<_, String>("timestamp")?),
        file_name: row.get("file_name")?,
        file_type: MediaKind::from_str(&row.get::<_, String>("file_type")?)
            .unwrap_or(MediaKind::Visual),
        detection_result: row.get("detection_result")?,
        confidence: row.get("confidence")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Database;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn detection_round_trip_preserves_bbox_json() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        let repo = db.detections();

        let detection = Detection::new(
            "motion",
            0.8,
            6.03,
            80.21,
            "",
            json!([{"bbox": [10, 20, 110, 220], "label": "human"}]),
        );
        repo.insert(&detection).unwrap();

        let stored = repo.recent(10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].detection_type, "motion");
        assert_eq!(stored[0].bbox_data[0]["label"], "human");
    }

    #[test]
    fn upload_history_round_trip() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        let repo = db.detections();

        let record =
            UploadRecord::new("scan.jpg", MediaKind::Thermal, "Detected 2 humans", 0.91);
        repo.insert_upload(&record).unwrap();

        let history = repo.upload_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].file_type, MediaKind::Thermal);
        assert_eq!(history[0].detection_result, "Detected 2 humans");
    }
}
