//! Gas event and emergency alert models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RobotReading;

/// Classification of a gas-history entry against the fixed cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasAlertLevel {
    Normal,
    Elevated,
    Warning,
    Critical,
}

impl GasAlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "elevated" => Some(Self::Elevated),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Classify a reading's combined MQ2/MQ135 levels.
    ///
    /// `warning` and `critical` entries are the ones that trigger the
    /// dashboard's gas-alert feed; `elevated` is logged but not raised.
    pub fn classify(mq2_level: f64, mq135_level: f64) -> Self {
        if mq2_level > 70.0 || mq135_level > 350.0 {
            Self::Critical
        } else if mq2_level > 50.0 || mq135_level > 250.0 {
            Self::Warning
        } else if mq2_level > 30.0 || mq135_level > 150.0 {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    /// Whether this level raises an alert.
    pub fn triggers_alert(&self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

/// A logged gas-monitoring event, written when a reading's gas levels are
/// significant (MQ2 > 20 or MQ135 > 100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasEvent {
    /// Database row ID.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub mq2_level: f64,
    pub mq135_level: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub alert_triggered: bool,
    pub alert_type: GasAlertLevel,
    pub methane_ppm: f64,
    pub hydrogen_ppm: f64,
    pub lpg_ppm: f64,
    pub smoke_ppm: f64,
    pub alcohol_ppm: f64,
}

impl GasEvent {
    /// Whether a reading is significant enough to log at all.
    pub fn is_significant(reading: &RobotReading) -> bool {
        reading.mq2_gas_level > 20.0 || reading.mq135_air_quality > 100.0
    }

    /// Build a gas event from a reading.
    pub fn from_reading(reading: &RobotReading) -> Self {
        let alert_type =
            GasAlertLevel::classify(reading.mq2_gas_level, reading.mq135_air_quality);
        Self {
            id: 0, // Set by database
            timestamp: reading.timestamp,
            mq2_level: reading.mq2_gas_level,
            mq135_level: reading.mq135_air_quality,
            latitude: reading.latitude,
            longitude: reading.longitude,
            alert_triggered: alert_type.triggers_alert(),
            alert_type,
            methane_ppm: reading.methane_ppm,
            hydrogen_ppm: reading.hydrogen_ppm,
            lpg_ppm: reading.lpg_ppm,
            smoke_ppm: reading.smoke_ppm,
            alcohol_ppm: reading.alcohol_ppm,
        }
    }
}

/// Severity of an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// An emergency alert raised when a reading arrives in emergency mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
    /// Database row ID.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    pub acknowledged: bool,
    /// Set once, when the alert is acknowledged.
    pub response_time: Option<DateTime<Utc>>,
}

impl EmergencyAlert {
    /// Build a gas-emergency alert from a reading in emergency mode.
    pub fn from_reading(reading: &RobotReading) -> Self {
        let severity =
            if reading.mq2_gas_level > 80.0 || reading.mq135_air_quality > 400.0 {
                AlertSeverity::Critical
            } else {
                AlertSeverity::High
            };

        let mut message = format!(
            "Emergency detected - Gas levels: MQ2={:.1}, MQ135={:.1}",
            reading.mq2_gas_level, reading.mq135_air_quality
        );
        if reading.motion_detected {
            message.push_str(", Human detected");
        }

        Self {
            id: 0, // Set by database
            timestamp: reading.timestamp,
            alert_type: "gas_emergency".to_string(),
            severity,
            message,
            latitude: reading.latitude,
            longitude: reading.longitude,
            acknowledged: false,
            response_time: None,
        }
    }
}
