//! Handlers for the dashboard server.

mod alerts_api;
mod analysis_api;
mod ingest;
mod pages;
mod telemetry_api;
mod uploads;

pub use alerts_api::{acknowledge_alert, emergency_alerts};
pub use analysis_api::{gas_analysis, safety_report};
pub use ingest::{receive_robot_data, simulate_robot_data};
pub use pages::{dashboard, serve_css};
pub use telemetry_api::{gas_alerts, gas_data, map_data, robot_data, system_status};
pub use uploads::{detections, serve_upload, upload, upload_history};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Convert a failure into the standard `{"error": ...}` 500 response.
pub(crate) fn internal_error(err: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Convert a rejected input into the standard `{"error": ...}` 400 response.
pub(crate) fn bad_request(err: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
