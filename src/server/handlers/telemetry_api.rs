//! Telemetry query handlers.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::internal_error;
use crate::config::DEFAULT_MAP_CENTER;
use crate::server::AppState;

/// `GET /api/robot-data` - the 50 most recent readings.
pub async fn robot_data(State(state): State<AppState>) -> Response {
    match state.telemetry.recent(50) {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/gas-data` - gas history from the last 24 hours.
pub async fn gas_data(State(state): State<AppState>) -> Response {
    match state.telemetry.gas_history(100, 24) {
        Ok(events) => Json(events).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/gas-alerts` - recent triggered gas-history entries.
pub async fn gas_alerts(State(state): State<AppState>) -> Response {
    match state.telemetry.gas_alerts(20) {
        Ok(events) => Json(events).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/map` - aggregated map data: recent located readings,
/// detections, gas alerts and unacknowledged emergency alerts.
pub async fn map_data(State(state): State<AppState>) -> Response {
    let readings = state.telemetry.recent(10).unwrap_or_default();

    let robot_locations: Vec<_> = readings
        .iter()
        .filter(|r| r.has_location())
        .map(|r| {
            json!({
                "lat": r.latitude,
                "lng": r.longitude,
                "timestamp": r.timestamp.to_rfc3339(),
                "battery": r.battery_level,
                "status": r.status,
                "motion": r.motion_detected,
                "mq2_gas_level": r.mq2_gas_level,
                "mq2_gas_detected": r.mq2_gas_detected,
                "mq135_air_quality": r.mq135_air_quality,
                "mq135_alert_detected": r.mq135_alert_detected,
                "system_healthy": r.system_healthy,
                "methane_ppm": r.methane_ppm,
                "lpg_ppm": r.lpg_ppm,
                "smoke_ppm": r.smoke_ppm,
                "emergency_mode": r.emergency_mode,
            })
        })
        .collect();

    let detections: Vec<_> = state
        .detections
        .recent(10)
        .unwrap_or_default()
        .into_iter()
        .filter(|d| d.latitude != 0.0 && d.longitude != 0.0)
        .map(|d| {
            json!({
                "lat": d.latitude,
                "lng": d.longitude,
                "type": d.detection_type,
                "confidence": d.confidence,
                "timestamp": d.timestamp.to_rfc3339(),
            })
        })
        .collect();

    let gas_alerts: Vec<_> = state
        .telemetry
        .gas_alerts(5)
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.latitude != 0.0 && a.longitude != 0.0)
        .map(|a| {
            json!({
                "lat": a.latitude,
                "lng": a.longitude,
                "mq2_level": a.mq2_level,
                "mq135_level": a.mq135_level,
                "alert_type": a.alert_type.as_str(),
                "timestamp": a.timestamp.to_rfc3339(),
            })
        })
        .collect();

    let emergency_alerts: Vec<_> = state
        .alerts
        .recent(5, Some(false))
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.latitude != 0.0 && a.longitude != 0.0)
        .map(|a| {
            json!({
                "lat": a.latitude,
                "lng": a.longitude,
                "alert_type": a.alert_type,
                "severity": a.severity.as_str(),
                "message": a.message,
                "timestamp": a.timestamp.to_rfc3339(),
            })
        })
        .collect();

    // Center the map on the located readings, falling back to the default
    // search area
    let center = if robot_locations.is_empty() {
        [DEFAULT_MAP_CENTER.0, DEFAULT_MAP_CENTER.1]
    } else {
        let located: Vec<_> = readings.iter().filter(|r| r.has_location()).collect();
        let n = located.len() as f64;
        [
            located.iter().map(|r| r.latitude).sum::<f64>() / n,
            located.iter().map(|r| r.longitude).sum::<f64>() / n,
        ]
    };

    Json(json!({
        "robot_locations": robot_locations,
        "detections": detections,
        "gas_alerts": gas_alerts,
        "emergency_alerts": emergency_alerts,
        "center": center,
    }))
    .into_response()
}

/// `GET /api/system-status` - overall system status including current gas
/// levels from the latest reading.
pub async fn system_status(State(state): State<AppState>) -> Response {
    let latest = match state.telemetry.latest() {
        Ok(latest) => latest,
        Err(e) => {
            return Json(json!({
                "system_online": false,
                "error": e.to_string(),
                "gas_monitoring_active": false,
            }))
            .into_response()
        }
    };

    let active_gas_alerts = state.telemetry.gas_alerts(5).map(|a| a.len()).unwrap_or(0);
    let active_emergency_alerts = state
        .alerts
        .recent(5, Some(false))
        .map(|a| a.len())
        .unwrap_or(0);

    let mut status = json!({
        "system_online": latest.is_some(),
        "last_update": latest.as_ref().map(|r| r.timestamp.to_rfc3339()),
        "active_gas_alerts": active_gas_alerts,
        "active_emergency_alerts": active_emergency_alerts,
        "gas_monitoring_active": true,
        "database_status": "connected",
    });

    // Latest health snapshot, if one was logged
    if let Some(entry) = state.status.recent(1).ok().and_then(|e| e.into_iter().next()) {
        status["network_status"] = json!(entry.network_status);
        status["sensor_status"] = json!(entry.sensor_status);
    }

    if let Some(reading) = latest {
        let environmental_status =
            if reading.mq2_gas_level < 30.0 && reading.mq135_air_quality < 150.0 {
                "safe"
            } else {
                "elevated"
            };

        status["current_gas_levels"] = json!({
            "mq2": reading.mq2_gas_level,
            "mq135": reading.mq135_air_quality,
            "methane_ppm": reading.methane_ppm,
            "lpg_ppm": reading.lpg_ppm,
            "smoke_ppm": reading.smoke_ppm,
        });
        status["environmental_status"] = json!(environmental_status);
        status["emergency_mode"] = json!(reading.emergency_mode);
    }

    Json(status).into_response()
}
