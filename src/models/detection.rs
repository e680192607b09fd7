//! Detection and upload-history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Modality of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Visual,
    Thermal,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Thermal => "thermal",
            Self::Audio => "audio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "visual" => Some(Self::Visual),
            "thermal" => Some(Self::Thermal),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Guess the modality from a filename extension.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" => Some(Self::Visual),
            "wav" | "mp3" | "flac" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Visual | Self::Thermal)
    }
}

/// A recorded detection, either from an upload or from an ingestion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Database row ID.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// What was detected: `motion`, `gas_fire_risk`, `toxic_air`,
    /// `thermal`, `visual`, `audio`, ...
    pub detection_type: String,
    pub confidence: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Source file, empty for sensor-derived detections.
    pub file_path: String,
    /// Opaque bounding-box payload.
    pub bbox_data: serde_json::Value,
}

impl Detection {
    pub fn new(
        detection_type: impl Into<String>,
        confidence: f64,
        latitude: f64,
        longitude: f64,
        file_path: impl Into<String>,
        bbox_data: serde_json::Value,
    ) -> Self {
        Self {
            id: 0, // Set by database
            timestamp: Utc::now(),
            detection_type: detection_type.into(),
            confidence,
            latitude,
            longitude,
            file_path: file_path.into(),
            bbox_data,
        }
    }
}

/// One entry in the upload history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Database row ID.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub file_type: MediaKind,
    /// Human-readable summary, e.g. "Detected 2 humans".
    pub detection_result: String,
    pub confidence: f64,
}

impl UploadRecord {
    pub fn new(
        file_name: impl Into<String>,
        file_type: MediaKind,
        detection_result: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: 0, // Set by database
            timestamp: Utc::now(),
            file_name: file_name.into(),
            file_type,
            detection_result: detection_result.into(),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("a.JPG"), Some(MediaKind::Visual));
        assert_eq!(MediaKind::from_extension("b.flac"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension("c.pdf"), None);
        assert_eq!(MediaKind::from_extension("noext"), None);
    }
}
