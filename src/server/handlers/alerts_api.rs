//! Emergency alert handlers.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::internal_error;
use crate::server::AppState;

/// Query parameters for the emergency alert listing.
#[derive(Debug, Deserialize)]
pub struct AlertParams {
    pub acknowledged: Option<bool>,
    pub limit: Option<usize>,
}

/// `GET /api/emergency-alerts` - recent alerts, optionally filtered by
/// acknowledgment state.
pub async fn emergency_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertParams>,
) -> Response {
    let limit = params.limit.unwrap_or(10);
    match state.alerts.recent(limit, params.acknowledged) {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `POST /api/acknowledge-alert/:alert_id` - acknowledge an alert.
///
/// Unknown IDs are a silent no-op.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> Response {
    match state.alerts.acknowledge(alert_id) {
        Ok(_) => Json(json!({ "message": "Alert acknowledged successfully" })).into_response(),
        Err(e) => internal_error(format!("Failed to acknowledge alert: {e}")),
    }
}
