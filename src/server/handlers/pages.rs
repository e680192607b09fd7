//! HTML page handlers.

use askama::Template;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};

use crate::server::assets;
use crate::server::templates::{
    DashboardTemplate, GasEventRow, LatestSummary, UploadRow,
};
use crate::server::AppState;

/// `GET /` - dashboard overview page.
pub async fn dashboard(State(state): State<AppState>) -> Response {
    let latest = state.telemetry.latest().ok().flatten();
    let reading_count = state.telemetry.count().unwrap_or(0);
    let unacknowledged_alerts = state.alerts.unacknowledged_count().unwrap_or(0);

    let gas_events: Vec<GasEventRow> = state
        .telemetry
        .gas_history(10, 24)
        .unwrap_or_default()
        .iter()
        .map(GasEventRow::from_event)
        .collect();

    let uploads: Vec<UploadRow> = state
        .detections
        .upload_history(5)
        .unwrap_or_default()
        .iter()
        .map(UploadRow::from_record)
        .collect();

    let template = DashboardTemplate {
        system_online: latest.is_some(),
        last_update: latest
            .as_ref()
            .map(|r| r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string()),
        reading_count,
        unacknowledged_alerts,
        latest: latest.as_ref().map(LatestSummary::from_reading),
        gas_events,
        uploads,
    };

    Html(template.render().unwrap_or_else(|e| e.to_string())).into_response()
}

/// `GET /static/style.css` - embedded stylesheet.
pub async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], assets::CSS)
}
