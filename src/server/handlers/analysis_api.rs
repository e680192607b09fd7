//! Analytics handlers: ad-hoc gas analysis and the safety report.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{bad_request, internal_error};
use crate::analysis::{analyze_gas_levels, generate_safety_report, GasKind};
use crate::server::AppState;

/// Request body for ad-hoc gas analysis.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GasAnalysisRequest {
    pub mq2_level: f64,
    pub mq135_level: f64,
    /// Optional specific-gas levels by name; unknown names are ignored.
    pub specific_gases: BTreeMap<String, f64>,
}

/// `POST /api/gas-analysis` - classify posted gas levels.
pub async fn gas_analysis(
    State(_state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let request: GasAnalysisRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return bad_request(format!("Gas analysis error: {e}")),
    };

    let specific: Vec<(GasKind, f64)> = request
        .specific_gases
        .iter()
        .filter_map(|(name, level)| GasKind::from_str(name).map(|kind| (kind, *level)))
        .collect();

    let analysis = analyze_gas_levels(
        request.mq2_level,
        request.mq135_level,
        &specific,
        &mut rand::thread_rng(),
    );
    Json(analysis).into_response()
}

/// `GET /api/safety-report` - full safety report over recent data.
pub async fn safety_report(State(state): State<AppState>) -> Response {
    let readings = match state.telemetry.recent(10) {
        Ok(readings) => readings,
        Err(e) => return internal_error(format!("Report generation error: {e}")),
    };
    let mut gas_history = match state.telemetry.gas_history(50, 24) {
        Ok(history) => history,
        Err(e) => return internal_error(format!("Report generation error: {e}")),
    };
    // Query results are newest first; pattern analysis wants chronological
    gas_history.reverse();

    let report = generate_safety_report(&readings, &gas_history, &mut rand::thread_rng());
    Json(report).into_response()
}
