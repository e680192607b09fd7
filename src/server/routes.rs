//! Router configuration for the dashboard server.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the dashboard router with all routes.
pub fn create_router(state: AppState) -> Router {
    let max_upload = state.max_upload_bytes;

    Router::new()
        // Dashboard page
        .route("/", get(handlers::dashboard))
        // Telemetry ingestion and queries
        .route(
            "/api/receive-robot-data",
            post(handlers::receive_robot_data),
        )
        .route("/api/robot-data", get(handlers::robot_data))
        .route("/api/gas-data", get(handlers::gas_data))
        .route("/api/gas-alerts", get(handlers::gas_alerts))
        .route("/api/simulate-robot-data", post(handlers::simulate_robot_data))
        // Emergency alerts
        .route("/api/emergency-alerts", get(handlers::emergency_alerts))
        .route(
            "/api/acknowledge-alert/:alert_id",
            post(handlers::acknowledge_alert),
        )
        // Analytics
        .route("/api/gas-analysis", post(handlers::gas_analysis))
        .route("/api/safety-report", get(handlers::safety_report))
        // Detections and uploads
        .route("/api/detections", get(handlers::detections))
        .route("/api/upload-history", get(handlers::upload_history))
        .route("/api/upload", post(handlers::upload))
        .route("/uploads/:filename", get(handlers::serve_upload))
        // Aggregated views
        .route("/api/map", get(handlers::map_data))
        .route("/api/system-status", get(handlers::system_status))
        // Static assets
        .route("/static/style.css", get(handlers::serve_css))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
