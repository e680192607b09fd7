//! Web server for the rover telemetry dashboard.
//!
//! Serves the JSON ingestion/query API plus a small HTML overview page.
//! The minimal detector upload app lives in [`detector_app`] with its own
//! router and state.

mod assets;
pub mod detector_app;
mod handlers;
mod routes;
mod templates;

pub use detector_app::serve_detector;
pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::inference::InferenceEngine;
use crate::repository::{
    AlertRepository, Database, DetectionRepository, StatusRepository, TelemetryRepository,
};

/// Shared state for the dashboard server.
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<TelemetryRepository>,
    pub alerts: Arc<AlertRepository>,
    pub detections: Arc<DetectionRepository>,
    pub status: Arc<StatusRepository>,
    pub engine: Arc<InferenceEngine>,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.ensure_directories()?;
        let db = Database::open(&settings.db_path())?;

        // Record a health snapshot for this server start
        let status = db.status();
        status.log(&crate::models::SystemStatusEntry::default())?;

        Ok(Self {
            telemetry: Arc::new(db.telemetry()),
            alerts: Arc::new(db.alerts()),
            detections: Arc::new(db.detections()),
            status: Arc::new(status),
            engine: Arc::new(InferenceEngine::new()),
            uploads_dir: settings.uploads_dir(),
            max_upload_bytes: settings.max_upload_bytes,
        })
    }
}

/// Start the dashboard server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting dashboard at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        let state = AppState::new(&settings).unwrap();
        let app = create_router(state);
        (app, dir)
    }

    async fn post_json(app: &axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn ingest_empty_payload_succeeds_with_defaults() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = post_json(&app, "/api/receive-robot-data", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["gas_alerts"].as_array().unwrap().len(), 0);

        let (status, json) = get_json(&app, "/api/robot-data").await;
        assert_eq!(status, StatusCode::OK);
        let readings = json.as_array().unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0]["status"], "Unknown");
        assert_eq!(readings[0]["battery_level"], 0.0);
        assert_eq!(readings[0]["is_stable"], true);
    }

    #[tokio::test]
    async fn ingest_malformed_json_is_bad_request() {
        let (app, _dir) = setup_test_app().await;
        let (status, json) =
            post_json(&app, "/api/receive-robot-data", r#"{"latitude": "north"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Error processing data"));
    }

    #[tokio::test]
    async fn fire_risk_flow_end_to_end() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = post_json(
            &app,
            "/api/receive-robot-data",
            r#"{"mq2_analog": 75.0, "mq135_reading": 100.0}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let alerts: Vec<&str> = json["gas_alerts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(alerts.contains(&"FIRE_RISK"));

        let (status, json) = get_json(&app, "/api/gas-alerts").await;
        assert_eq!(status, StatusCode::OK);
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["alert_type"], "critical");

        // The fire-risk detection row was recorded too
        let (_, json) = get_json(&app, "/api/detections").await;
        assert!(json
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["detection_type"] == "gas_fire_risk"));
    }

    #[tokio::test]
    async fn independent_threshold_tags_accumulate() {
        let (app, _dir) = setup_test_app().await;

        let (_, json) = post_json(
            &app,
            "/api/receive-robot-data",
            r#"{"mq2_analog": 55.0, "mq135_reading": 260.0, "methane_ppm": 1500.0,
                "lpg_ppm": 600.0, "smoke_ppm": 600.0, "system_healthy": false,
                "emergency_mode": true}"#,
        )
        .await;

        let alerts: Vec<&str> = json["gas_alerts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            alerts,
            vec![
                "HIGH_GAS",
                "POOR_AIR",
                "METHANE_HIGH",
                "LPG_HIGH",
                "SMOKE_HIGH",
                "SYSTEM_FAILURE",
                "EMERGENCY_ACTIVE"
            ]
        );
        assert_eq!(json["emergency_status"], true);
    }

    #[tokio::test]
    async fn acknowledge_flow_removes_alert_from_unacknowledged() {
        let (app, _dir) = setup_test_app().await;

        post_json(
            &app,
            "/api/receive-robot-data",
            r#"{"mq2_analog": 85.0, "emergency_mode": true}"#,
        )
        .await;

        let (_, json) = get_json(&app, "/api/emergency-alerts?acknowledged=false").await;
        let alerts = json.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        let id = alerts[0]["id"].as_i64().unwrap();
        assert_eq!(alerts[0]["severity"], "critical");

        let (status, _) =
            post_json(&app, &format!("/api/acknowledge-alert/{id}"), "{}").await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = get_json(&app, "/api/emergency-alerts?acknowledged=false").await;
        assert_eq!(json.as_array().unwrap().len(), 0);

        let (_, json) = get_json(&app, "/api/emergency-alerts?acknowledged=true").await;
        let alerts = json.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0]["response_time"].is_string());
    }

    #[tokio::test]
    async fn acknowledge_unknown_id_is_silent() {
        let (app, _dir) = setup_test_app().await;
        let (status, json) = post_json(&app, "/api/acknowledge-alert/424242", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn gas_analysis_endpoint_classifies_levels() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = post_json(
            &app,
            "/api/gas-analysis",
            r#"{"mq2_level": 85.0, "mq135_level": 100.0}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["overall_safety"], "caution");
        assert_eq!(json["risk_level"], 5);
        assert_eq!(json["mq2_analysis"]["status"], "caution");
        assert_eq!(json["mq135_analysis"]["status"], "good");
    }

    #[tokio::test]
    async fn gas_analysis_accepts_specific_gases() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = post_json(
            &app,
            "/api/gas-analysis",
            r#"{"mq2_level": 10.0, "mq135_level": 50.0,
                "specific_gases": {"methane": 6000.0, "unknown_gas": 1.0}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["overall_safety"], "critical");
        assert_eq!(json["specific_gas_analysis"]["methane"]["status"], "critical");
        assert!(json["specific_gas_analysis"]["unknown_gas"].is_null());
    }

    #[tokio::test]
    async fn safety_report_endpoint_works_on_empty_database() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = get_json(&app, "/api/safety-report").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["report_id"].as_str().unwrap().starts_with("SR_"));
        assert!(json["executive_summary"].as_str().unwrap().starts_with("SAFE"));
    }

    #[tokio::test]
    async fn map_endpoint_aggregates_located_data() {
        let (app, _dir) = setup_test_app().await;

        // A reading without GPS lock is excluded from the map
        post_json(&app, "/api/receive-robot-data", "{}").await;
        post_json(
            &app,
            "/api/receive-robot-data",
            r#"{"latitude": 6.1, "longitude": 80.3, "mq2_analog": 75.0, "emergency_mode": true}"#,
        )
        .await;

        let (status, json) = get_json(&app, "/api/map").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["robot_locations"].as_array().unwrap().len(), 1);
        assert_eq!(json["gas_alerts"].as_array().unwrap().len(), 1);
        assert_eq!(json["emergency_alerts"].as_array().unwrap().len(), 1);
        let center = json["center"].as_array().unwrap();
        assert!((center[0].as_f64().unwrap() - 6.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn map_endpoint_uses_default_center_without_data() {
        let (app, _dir) = setup_test_app().await;
        let (_, json) = get_json(&app, "/api/map").await;
        let center = json["center"].as_array().unwrap();
        assert!((center[0].as_f64().unwrap() - 6.0329).abs() < 1e-9);
        assert!((center[1].as_f64().unwrap() - 80.2168).abs() < 1e-9);
    }

    #[tokio::test]
    async fn system_status_reflects_latest_reading() {
        let (app, _dir) = setup_test_app().await;

        let (_, json) = get_json(&app, "/api/system-status").await;
        assert_eq!(json["system_online"], false);

        post_json(
            &app,
            "/api/receive-robot-data",
            r#"{"mq2_analog": 45.0, "mq135_reading": 120.0}"#,
        )
        .await;

        let (status, json) = get_json(&app, "/api/system-status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["system_online"], true);
        assert_eq!(json["environmental_status"], "elevated");
        assert_eq!(json["current_gas_levels"]["mq2"], 45.0);
        assert_eq!(json["sensor_status"], "operational");
    }

    #[tokio::test]
    async fn simulate_endpoint_inserts_reading() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = post_json(&app, "/api/simulate-robot-data", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["gas_data_included"], true);

        let (_, json) = get_json(&app, "/api/robot-data").await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension() {
        let (app, _dir) = setup_test_app().await;

        let boundary = "ROVERBOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             fake\r\n\
             --{boundary}--\r\n"
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_image_runs_inference_and_records_history() {
        let (app, _dir) = setup_test_app().await;

        // Encode a small real PNG in memory
        let mut png_bytes = Vec::new();
        let img = image::RgbImage::from_pixel(320, 240, image::Rgb([30, 30, 30]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let boundary = "ROVERBOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\n\
                 Content-Disposition: form-data; name=\"type\"\r\n\r\n\
                 thermal\r\n\
                 --{boundary}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png_bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["detection_type"], "thermal");
        assert!(json["count"].is_u64());

        let (_, history) = get_json(&app, "/api/upload-history").await;
        let entries = history.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["file_type"], "thermal");
        assert!(entries[0]["file_name"].as_str().unwrap().ends_with("scan.png"));
    }

    #[tokio::test]
    async fn dashboard_page_renders_html() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<!DOCTYPE html>") || html.contains("<html"));
        assert!(html.contains("RoverWatch"));
    }

    #[tokio::test]
    async fn static_css_is_served() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/static/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap_or(""));
        assert!(content_type.unwrap_or("").contains("css"));
    }

    #[tokio::test]
    async fn uploads_route_rejects_path_traversal() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/uploads/..%2Frover.db")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
