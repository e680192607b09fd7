//! Telemetry reading models.
//!
//! The rover firmware posts JSON with whatever sensors it currently has
//! powered; every field is optional on the wire and resolves to a
//! documented default, so ingestion never fails on partial telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw ingestion payload as sent by the rover firmware.
///
/// Field names follow the firmware's wire format (`mq2_analog`,
/// `mq135_reading`, ...); missing fields take the values from
/// [`Default`], which encodes the documented per-field defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub front_distance: f64,
    pub back_distance: f64,
    pub motion_detected: bool,
    pub battery_level: f64,
    pub status: String,

    pub gps_valid: bool,
    pub satellites: i64,
    pub altitude: f64,
    pub speed: f64,
    pub heading: f64,

    /// MQ2 combustible-gas channel, raw analog percentage.
    pub mq2_analog: f64,
    /// MQ2 digital threshold pin.
    pub mq2_digital: bool,
    /// MQ135 air-quality channel, ppm.
    pub mq135_reading: f64,

    pub temperature: f64,
    pub orientation: f64,
    pub is_stable: bool,
    pub sound_detected: bool,

    pub distance_traveled: f64,
    pub search_pattern: i64,
    pub system_healthy: bool,
    pub current_state: String,

    pub methane_ppm: f64,
    pub hydrogen_ppm: f64,
    pub lpg_ppm: f64,
    pub smoke_ppm: f64,
    pub alcohol_ppm: f64,
    pub mq2_resistance: f64,
    pub emergency_mode: bool,
}

impl Default for TelemetryPayload {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            front_distance: 0.0,
            back_distance: 0.0,
            motion_detected: false,
            battery_level: 0.0,
            status: "Unknown".to_string(),
            gps_valid: false,
            satellites: 0,
            altitude: 0.0,
            speed: 0.0,
            heading: 0.0,
            mq2_analog: 0.0,
            mq2_digital: false,
            mq135_reading: 0.0,
            temperature: 0.0,
            orientation: 0.0,
            is_stable: true,
            sound_detected: false,
            distance_traveled: 0.0,
            search_pattern: 0,
            system_healthy: true,
            current_state: "Unknown".to_string(),
            methane_ppm: 0.0,
            hydrogen_ppm: 0.0,
            lpg_ppm: 0.0,
            smoke_ppm: 0.0,
            alcohol_ppm: 0.0,
            mq2_resistance: 0.0,
            emergency_mode: false,
        }
    }
}

/// One stored telemetry reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotReading {
    /// Database row ID.
    pub id: i64,
    /// When the reading was ingested.
    pub timestamp: DateTime<Utc>,

    pub latitude: f64,
    pub longitude: f64,
    pub front_distance: f64,
    pub back_distance: f64,
    pub motion_detected: bool,
    pub battery_level: f64,
    pub status: String,

    pub gps_valid: bool,
    pub satellites: i64,
    pub altitude: f64,
    pub speed: f64,
    pub heading: f64,

    pub mq2_gas_level: f64,
    pub mq2_gas_detected: bool,
    pub mq135_air_quality: f64,
    pub mq135_alert_detected: bool,

    pub temperature: f64,
    pub orientation: f64,
    pub is_stable: bool,
    pub sound_detected: bool,

    pub distance_traveled: f64,
    pub search_pattern: i64,
    pub system_healthy: bool,
    pub current_state: String,

    pub methane_ppm: f64,
    pub hydrogen_ppm: f64,
    pub lpg_ppm: f64,
    pub smoke_ppm: f64,
    pub alcohol_ppm: f64,
    pub mq2_resistance: f64,
    pub emergency_mode: bool,
}

impl RobotReading {
    /// Build a reading from a wire payload.
    ///
    /// The MQ135 alert flag is derived here: the firmware's digital pin is
    /// unreliable, so the flag is recomputed from the analog reading.
    pub fn from_payload(payload: TelemetryPayload) -> Self {
        let mq135_alert_detected = payload.mq135_reading > 500.0;
        Self {
            id: 0, // Set by database
            timestamp: Utc::now(),
            latitude: payload.latitude,
            longitude: payload.longitude,
            front_distance: payload.front_distance,
            back_distance: payload.back_distance,
            motion_detected: payload.motion_detected,
            battery_level: payload.battery_level,
            status: payload.status,
            gps_valid: payload.gps_valid,
            satellites: payload.satellites,
            altitude: payload.altitude,
            speed: payload.speed,
            heading: payload.heading,
            mq2_gas_level: payload.mq2_analog,
            mq2_gas_detected: payload.mq2_digital,
            mq135_air_quality: payload.mq135_reading,
            mq135_alert_detected,
            temperature: payload.temperature,
            orientation: payload.orientation,
            is_stable: payload.is_stable,
            sound_detected: payload.sound_detected,
            distance_traveled: payload.distance_traveled,
            search_pattern: payload.search_pattern,
            system_healthy: payload.system_healthy,
            current_state: payload.current_state,
            methane_ppm: payload.methane_ppm,
            hydrogen_ppm: payload.hydrogen_ppm,
            lpg_ppm: payload.lpg_ppm,
            smoke_ppm: payload.smoke_ppm,
            alcohol_ppm: payload.alcohol_ppm,
            mq2_resistance: payload.mq2_resistance,
            emergency_mode: payload.emergency_mode,
        }
    }

    /// Whether the reading carries a usable position.
    pub fn has_location(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_resolves_to_defaults() {
        let payload: TelemetryPayload = serde_json::from_str("{}").unwrap();
        let reading = RobotReading::from_payload(payload);

        assert_eq!(reading.latitude, 0.0);
        assert_eq!(reading.battery_level, 0.0);
        assert_eq!(reading.status, "Unknown");
        assert_eq!(reading.current_state, "Unknown");
        assert!(!reading.motion_detected);
        assert!(!reading.emergency_mode);
        assert!(reading.is_stable);
        assert!(reading.system_healthy);
    }

    #[test]
    fn partial_payload_keeps_present_fields() {
        let payload: TelemetryPayload =
            serde_json::from_str(r#"{"latitude": 6.03, "mq2_analog": 42.5, "satellites": 7}"#)
                .unwrap();
        let reading = RobotReading::from_payload(payload);

        assert_eq!(reading.latitude, 6.03);
        assert_eq!(reading.mq2_gas_level, 42.5);
        assert_eq!(reading.satellites, 7);
        assert_eq!(reading.longitude, 0.0);
    }

    #[test]
    fn mq135_alert_flag_derived_from_reading() {
        let payload: TelemetryPayload =
            serde_json::from_str(r#"{"mq135_reading": 501.0}"#).unwrap();
        assert!(RobotReading::from_payload(payload).mq135_alert_detected);

        let payload: TelemetryPayload =
            serde_json::from_str(r#"{"mq135_reading": 500.0}"#).unwrap();
        assert!(!RobotReading::from_payload(payload).mq135_alert_detected);
    }
}
