//! Telemetry ingestion handlers.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{bad_request, internal_error};
use crate::inference::synthetic_payload;
use crate::models::{Detection, RobotReading, TelemetryPayload};
use crate::server::AppState;

/// `POST /api/receive-robot-data` - ingest one telemetry reading.
///
/// Missing fields resolve to defaults; the reading plus its derived
/// gas-history/emergency rows are committed atomically, then the reading
/// is checked against the independent alert thresholds.
pub async fn receive_robot_data(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let payload: TelemetryPayload = match serde_json::from_value(body) {
        Ok(payload) => payload,
        Err(e) => return bad_request(format!("Error processing data: {e}")),
    };

    let reading = RobotReading::from_payload(payload);
    if let Err(e) = state.telemetry.ingest(&reading) {
        return internal_error(format!("Error processing data: {e}"));
    }

    let gas_alerts = evaluate_alerts(&state, &reading);

    // Payload fields carried on the reading (row id and timestamp are not
    // part of the wire payload)
    let processed_fields = serde_json::to_value(&reading)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.len() - 2))
        .unwrap_or(0);

    Json(json!({
        "message": "Telemetry received successfully",
        "status": "ok",
        "received_at": Utc::now().to_rfc3339(),
        "gas_alerts": gas_alerts,
        "processed_fields": processed_fields,
        "emergency_status": reading.emergency_mode,
    }))
    .into_response()
}

/// `POST /api/simulate-robot-data` - ingest one synthetic reading.
///
/// Goes through the same ingestion path as real telemetry, so simulated
/// emergencies produce the same alert rows.
pub async fn simulate_robot_data(State(state): State<AppState>) -> Response {
    let payload = synthetic_payload(&mut rand::thread_rng());
    let reading = RobotReading::from_payload(payload);

    if let Err(e) = state.telemetry.ingest(&reading) {
        return internal_error(format!("Simulation failed: {e}"));
    }
    evaluate_alerts(&state, &reading);

    Json(json!({
        "message": "Robot data simulated successfully",
        "gas_data_included": true,
        "emergency_simulated": reading.emergency_mode,
    }))
    .into_response()
}

/// Check a reading against the independent per-channel thresholds,
/// recording detection rows for the hazards that carry one.
///
/// Each check looks only at the single incoming reading; no history is
/// consulted and no two checks interact.
fn evaluate_alerts(state: &AppState, reading: &RobotReading) -> Vec<&'static str> {
    let mut alerts = Vec::new();

    if reading.motion_detected {
        info!(
            "Motion detected at {}, {}",
            reading.latitude, reading.longitude
        );
        record_detection(state, "motion", 0.8, reading);
    }

    if reading.mq2_gas_level > 70.0 || reading.mq2_gas_detected {
        warn!("FIRE RISK: MQ2 gas level at {}%", reading.mq2_gas_level);
        record_detection(state, "gas_fire_risk", reading.mq2_gas_level / 100.0, reading);
        alerts.push("FIRE_RISK");
    } else if reading.mq2_gas_level > 50.0 {
        warn!("High combustible gas: MQ2 at {}%", reading.mq2_gas_level);
        alerts.push("HIGH_GAS");
    }

    if reading.mq135_air_quality > 350.0 || reading.mq135_alert_detected {
        warn!(
            "TOXIC AIR: MQ135 air quality at {}ppm",
            reading.mq135_air_quality
        );
        record_detection(state, "toxic_air", reading.mq135_air_quality / 500.0, reading);
        alerts.push("TOXIC_AIR");
    } else if reading.mq135_air_quality > 250.0 {
        warn!("Poor air quality: MQ135 at {}ppm", reading.mq135_air_quality);
        alerts.push("POOR_AIR");
    }

    if reading.methane_ppm > 1000.0 {
        warn!("METHANE ALERT: {} ppm detected", reading.methane_ppm);
        alerts.push("METHANE_HIGH");
    }
    if reading.lpg_ppm > 500.0 {
        warn!("LPG ALERT: {} ppm detected", reading.lpg_ppm);
        alerts.push("LPG_HIGH");
    }
    if reading.smoke_ppm > 500.0 {
        warn!("SMOKE ALERT: {} ppm detected", reading.smoke_ppm);
        alerts.push("SMOKE_HIGH");
    }

    if !reading.system_healthy {
        warn!("System health issues detected");
        alerts.push("SYSTEM_FAILURE");
    }
    if reading.emergency_mode {
        warn!("EMERGENCY MODE ACTIVE");
        alerts.push("EMERGENCY_ACTIVE");
    }

    alerts
}

fn record_detection(state: &AppState, kind: &str, confidence: f64, reading: &RobotReading) {
    let detection = Detection::new(
        kind,
        confidence,
        reading.latitude,
        reading.longitude,
        "",
        serde_json::Value::Array(Vec::new()),
    );
    if let Err(e) = state.detections.insert(&detection) {
        warn!("Failed to record {} detection: {}", kind, e);
    }
}
