//! Minimal detection upload app.
//!
//! A separate router from the dashboard: serves an upload form, hands the
//! image to the external detector CLI, copies the annotated output and
//! renders a results page parsed from the tool's label files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::warn;

use super::handlers::serve_css;
use super::templates::{LabelRow, ResultTemplate, UploadTemplate};
use crate::config::Settings;
use crate::detector::{parse_label_file, ExternalDetector};

/// Shared state for the detector app.
#[derive(Clone)]
pub struct DetectorState {
    pub detector: Arc<ExternalDetector>,
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl DetectorState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.ensure_directories()?;
        Ok(Self {
            detector: Arc::new(ExternalDetector::new(settings.detector.clone())),
            uploads_dir: settings.uploads_dir(),
            results_dir: settings.results_dir(),
        })
    }
}

/// Create the detector app router.
pub fn create_detector_router(state: DetectorState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(upload_form).post(run_detection))
        .route("/result/:filename", get(result_page))
        .route("/results/:filename", get(serve_result))
        .route("/uploads/:filename", get(serve_original))
        .route("/static/style.css", get(serve_css))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the detector app server.
pub async fn serve_detector(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = DetectorState::new(settings)?;
    if let Err(e) = state.detector.check_available() {
        warn!("Detector tool not available: {}", e);
    }

    let app = create_detector_router(state, settings.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting detector app at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `GET /` - upload form.
async fn upload_form() -> Response {
    render(UploadTemplate::new())
}

/// `POST /` - store the image, run the external detector and redirect to
/// the result page.
async fn run_detection(State(state): State<DetectorState>, mut multipart: Multipart) -> Response {
    let mut image_data = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return render(UploadTemplate::with_error(format!("Invalid upload: {e}"))),
        };

        if field.name() == Some("image") {
            let has_name = field.file_name().map(|n| !n.is_empty()).unwrap_or(false);
            if !has_name {
                continue;
            }
            image_data = match field.bytes().await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    return render(UploadTemplate::with_error(format!("Invalid upload: {e}")))
                }
            };
        }
    }

    let Some(data) = image_data else {
        return render(UploadTemplate::with_error("No image selected"));
    };

    let filename = format!("{}.jpg", uuid::Uuid::new_v4().simple());
    let upload_path = state.uploads_dir.join(&filename);
    if let Err(e) = std::fs::write(&upload_path, &data) {
        return render(UploadTemplate::with_error(format!(
            "Failed to store image: {e}"
        )));
    }

    // The detector is an external process; keep it off the runtime threads
    let detector = state.detector.clone();
    let results_dir = state.results_dir.clone();
    let run_name = filename.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        detector.run(&upload_path)?;
        detector.collect_output(&run_name, &results_dir)
    })
    .await;

    match outcome {
        Ok(Ok(_)) => Redirect::to(&format!("/result/{filename}")).into_response(),
        Ok(Err(e)) => {
            warn!("Detection failed for {}: {}", filename, e);
            render(UploadTemplate::with_error(format!("Detection failed: {e}")))
        }
        Err(e) => render(UploadTemplate::with_error(format!("Detection crashed: {e}"))),
    }
}

/// `GET /result/:filename` - result image plus the parsed label table.
async fn result_page(
    State(state): State<DetectorState>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if !is_safe_name(&filename) {
        return (StatusCode::BAD_REQUEST, Html("Invalid filename".to_string())).into_response();
    }

    let label_path = state.detector.label_path(&filename);
    let detections = match parse_label_file(&label_path) {
        Ok(detections) => detections,
        Err(e) => {
            warn!("Failed to parse labels for {}: {}", filename, e);
            Vec::new()
        }
    };

    let rows: Vec<LabelRow> = detections.iter().map(LabelRow::from_detection).collect();
    render(ResultTemplate {
        filename,
        has_detections: !rows.is_empty(),
        detections: rows,
    })
}

/// `GET /results/:filename` - serve an annotated result image.
async fn serve_result(
    State(state): State<DetectorState>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if !is_safe_name(&filename) {
        return (StatusCode::BAD_REQUEST, Html("Invalid filename".to_string())).into_response();
    }

    match tokio::fs::read(state.results_dir.join(&filename)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("Not found".to_string())).into_response(),
    }
}

/// `GET /uploads/:filename` - serve an uploaded original.
async fn serve_original(
    State(state): State<DetectorState>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if !is_safe_name(&filename) {
        return (StatusCode::BAD_REQUEST, Html("Invalid filename".to_string())).into_response();
    }

    match tokio::fs::read(state.uploads_dir.join(&filename)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("Not found".to_string())).into_response(),
    }
}

fn is_safe_name(filename: &str) -> bool {
    !filename.contains("..") && !filename.contains('/') && !filename.contains('\\')
}

fn render(template: impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| e.to_string())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn setup_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::with_data_dir(dir.path().join("data"));
        settings.detector.tool_dir = dir.path().join("yolo");
        let state = DetectorState::new(&settings).unwrap();
        let app = create_detector_router(state, settings.max_upload_bytes);
        (app, dir)
    }

    async fn get_html(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn upload_form_renders() {
        let (app, _dir) = setup_test_app();
        let (status, html) = get_html(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("multipart/form-data"));
    }

    #[tokio::test]
    async fn result_page_without_labels_shows_no_detections() {
        let (app, _dir) = setup_test_app();
        let (status, html) = get_html(&app, "/result/abc123.jpg").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No detections found"));
    }

    #[tokio::test]
    async fn result_page_renders_parsed_labels() {
        let (app, dir) = setup_test_app();

        let labels_dir = dir.path().join("yolo/runs/detect/rover_detect/labels");
        std::fs::create_dir_all(&labels_dir).unwrap();
        std::fs::write(
            labels_dir.join("abc123.txt"),
            "0 0.512345 0.43 0.21 0.18 0.873456\n",
        )
        .unwrap();

        let (status, html) = get_html(&app, "/result/abc123.jpg").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("0.512"));
        assert!(html.contains("0.873"));
        assert!(!html.contains("No detections found"));
    }

    #[tokio::test]
    async fn result_image_route_rejects_traversal() {
        let (app, _dir) = setup_test_app();
        let (status, _) = get_html(&app, "/results/..%2Fdata%2Frover.db").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
