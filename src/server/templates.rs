//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/
//! directory. Display values are pre-formatted here so the templates stay
//! free of formatting logic.

use askama::Template;

use crate::detector::LabelDetection;
use crate::models::{GasEvent, RobotReading, UploadRecord};

/// Dashboard overview page.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub system_online: bool,
    pub last_update: String,
    pub reading_count: i64,
    pub unacknowledged_alerts: i64,
    pub latest: Option<LatestSummary>,
    pub gas_events: Vec<GasEventRow>,
    pub uploads: Vec<UploadRow>,
}

/// Latest-reading summary card.
pub struct LatestSummary {
    pub battery_str: String,
    pub state: String,
    pub position_str: String,
    pub mq2_str: String,
    pub mq135_str: String,
    pub emergency: bool,
}

impl LatestSummary {
    pub fn from_reading(reading: &RobotReading) -> Self {
        Self {
            battery_str: format!("{:.0}%", reading.battery_level),
            state: reading.current_state.clone(),
            position_str: if reading.has_location() {
                format!("{:.4}, {:.4}", reading.latitude, reading.longitude)
            } else {
                "no GPS fix".to_string()
            },
            mq2_str: format!("{:.1}", reading.mq2_gas_level),
            mq135_str: format!("{:.0} ppm", reading.mq135_air_quality),
            emergency: reading.emergency_mode,
        }
    }
}

/// Row in the recent gas events table.
pub struct GasEventRow {
    pub time_str: String,
    pub mq2_str: String,
    pub mq135_str: String,
    pub level: String,
    pub triggered: bool,
}

impl GasEventRow {
    pub fn from_event(event: &GasEvent) -> Self {
        Self {
            time_str: event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            mq2_str: format!("{:.1}", event.mq2_level),
            mq135_str: format!("{:.0}", event.mq135_level),
            level: event.alert_type.as_str().to_string(),
            triggered: event.alert_triggered,
        }
    }
}

/// Row in the recent uploads table.
pub struct UploadRow {
    pub time_str: String,
    pub file_name: String,
    pub file_type: String,
    pub result: String,
    pub confidence_str: String,
}

impl UploadRow {
    pub fn from_record(record: &UploadRecord) -> Self {
        Self {
            time_str: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            file_name: record.file_name.clone(),
            file_type: record.file_type.as_str().to_string(),
            result: record.detection_result.clone(),
            confidence_str: format!("{:.2}", record.confidence),
        }
    }
}

/// Detector app: upload form.
#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub error: String,
    pub has_error: bool,
}

impl UploadTemplate {
    pub fn new() -> Self {
        Self {
            error: String::new(),
            has_error: false,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            has_error: true,
        }
    }
}

impl Default for UploadTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Detector app: result page.
#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate {
    pub filename: String,
    pub detections: Vec<LabelRow>,
    pub has_detections: bool,
}

/// One row of the detection results table.
pub struct LabelRow {
    pub class_id: String,
    pub x_str: String,
    pub y_str: String,
    pub w_str: String,
    pub h_str: String,
    pub conf_str: String,
}

impl LabelRow {
    pub fn from_detection(detection: &LabelDetection) -> Self {
        Self {
            class_id: detection.class_id.clone(),
            x_str: format!("{:.3}", detection.x_center),
            y_str: format!("{:.3}", detection.y_center),
            w_str: format!("{:.3}", detection.width),
            h_str: format!("{:.3}", detection.height),
            conf_str: format!("{:.3}", detection.confidence),
        }
    }
}
