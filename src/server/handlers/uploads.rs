//! Upload handling and detection queries.

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::{bad_request, internal_error};
use crate::inference::box_color;
use crate::models::{MediaKind, UploadRecord};
use crate::server::AppState;

const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "wav", "mp3", "flac"];

/// `GET /api/detections` - the 30 most recent detections.
pub async fn detections(State(state): State<AppState>) -> Response {
    match state.detections.recent(30) {
        Ok(detections) => Json(detections).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/upload-history` - the 20 most recent uploads.
pub async fn upload_history(State(state): State<AppState>) -> Response {
    match state.detections.upload_history(20) {
        Ok(history) => Json(history).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `POST /api/upload` - store an uploaded file, run simulated detection
/// on it and record the result.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file_name = None;
    let mut file_data = None;
    let mut declared_type = "auto".to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Invalid upload: {e}")),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = match field.bytes().await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => return bad_request(format!("Invalid upload: {e}")),
                };
            }
            "type" => {
                declared_type = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return bad_request(format!("Invalid upload: {e}")),
                };
            }
            _ => {}
        }
    }

    let Some(original_name) = file_name.filter(|n| !n.is_empty()) else {
        return bad_request("No selected file");
    };
    let Some(data) = file_data else {
        return bad_request("No file part");
    };

    let sanitized = sanitize_filename(&original_name);
    if !has_allowed_extension(&sanitized) {
        return bad_request("Invalid file type");
    }

    let kind = match declared_type.as_str() {
        "auto" => match MediaKind::from_extension(&sanitized) {
            Some(kind) => kind,
            None => return bad_request("Invalid file type"),
        },
        other => match MediaKind::from_str(other) {
            Some(kind) => kind,
            None => return bad_request(format!("Unknown upload type: {other}")),
        },
    };

    let stored_name = format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), sanitized);
    let stored_path = state.uploads_dir.join(&stored_name);
    if let Err(e) = std::fs::write(&stored_path, &data) {
        return internal_error(format!("Failed to store upload: {e}"));
    }

    let mut rng = rand::thread_rng();
    let engine = &state.engine;

    // Run the matching scan, collect boxes to draw and the history summary
    let (mut result, boxes, summary, confidence) = match kind {
        MediaKind::Thermal => match engine.detect_thermal(&stored_path, &mut rng) {
            Ok(scan) => {
                let boxes: Vec<_> = scan
                    .detections
                    .iter()
                    .map(|d| (d.bbox, box_color(None, d.confidence)))
                    .collect();
                let summary = format!("Detected {} humans", scan.count);
                let confidence = scan.highest_confidence;
                (json!(scan), boxes, summary, confidence)
            }
            Err(e) => return internal_error(format!("Thermal detection error: {e}")),
        },
        MediaKind::Visual => match engine.detect_visual(&stored_path, &mut rng) {
            Ok(scan) => {
                let boxes: Vec<_> = scan
                    .detections
                    .iter()
                    .map(|d| (d.bbox, box_color(Some(d.threat_level), d.confidence)))
                    .collect();
                let summary = format!("Detected {} humans", scan.count);
                let confidence = scan.highest_confidence;
                (json!(scan), boxes, summary, confidence)
            }
            Err(e) => return internal_error(format!("Visual detection error: {e}")),
        },
        MediaKind::Audio => match engine.detect_voice(&stored_path, &mut rng) {
            Ok(scan) => {
                let summary = format!("Voice detected: {}", scan.detected);
                let confidence = scan.confidence;
                (json!(scan), Vec::new(), summary, confidence)
            }
            Err(e) => return internal_error(format!("Voice detection error: {e}")),
        },
    };

    let record = UploadRecord::new(stored_name.clone(), kind, summary, confidence);
    if let Err(e) = state.detections.insert_upload(&record) {
        warn!("Failed to record upload history: {}", e);
    }

    if kind.is_image() && !boxes.is_empty() {
        match engine.annotate_image(&stored_path, &boxes) {
            Ok(processed) => {
                if let Some(name) = processed.file_name() {
                    result["processed_image"] = json!(name.to_string_lossy());
                }
            }
            Err(e) => warn!("Failed to annotate {}: {}", stored_name, e),
        }
    }

    Json(result).into_response()
}

/// `GET /uploads/:filename` - serve a stored upload.
pub async fn serve_upload(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return bad_request("Invalid filename");
    }

    let path = state.uploads_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = content_type_for(&filename);
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip path components and unsafe characters from a client filename.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
