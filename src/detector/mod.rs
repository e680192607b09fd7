//! External object-detector glue.
//!
//! The upload app does not run a model itself; it shells out to a
//! command-line detector (a YOLOv5-style `detect.py`), copies the
//! annotated output image, and parses the label files the tool writes
//! (six whitespace-separated fields per line).

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use thiserror::Error;

use crate::config::DetectorSettings;

/// Errors from the external detector.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    #[error("Detector produced no output image: {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed label-file line, normalized coordinates rounded to three
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelDetection {
    pub class_id: String,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

/// Wrapper around the external detection CLI.
pub struct ExternalDetector {
    settings: DetectorSettings,
}

impl ExternalDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }

    /// Check that the interpreter running the detector is installed.
    pub fn check_available(&self) -> Result<(), DetectorError> {
        which::which(&self.settings.interpreter)
            .map(|_| ())
            .map_err(|_| DetectorError::ToolNotFound(self.settings.interpreter.clone()))
    }

    /// Run detection on one source image.
    ///
    /// Output lands under the detector's own runs directory; use
    /// [`Self::output_image`] and [`Self::label_path`] to locate it.
    pub fn run(&self, source: &Path) -> Result<(), DetectorError> {
        let script = self.settings.tool_dir.join("detect.py");
        let result = Command::new(&self.settings.interpreter)
            .arg(&script)
            .arg("--weights")
            .arg(&self.settings.weights)
            .arg("--img")
            .arg(self.settings.image_size.to_string())
            .arg("--conf-thres")
            .arg(self.settings.confidence_threshold.to_string())
            .arg("--source")
            .arg(source)
            .arg("--save-conf")
            .arg("--save-txt")
            .arg("--project")
            .arg(self.settings.tool_dir.join("runs/detect"))
            .arg("--name")
            .arg(&self.settings.run_name)
            .arg("--exist-ok")
            .output();

        match result {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(DetectorError::DetectionFailed(stderr.trim().to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                DetectorError::ToolNotFound(self.settings.interpreter.clone()),
            ),
            Err(e) => Err(DetectorError::Io(e)),
        }
    }

    fn run_dir(&self) -> PathBuf {
        self.settings
            .tool_dir
            .join("runs/detect")
            .join(&self.settings.run_name)
    }

    /// Where the detector wrote its annotated copy of `filename`.
    pub fn output_image(&self, filename: &str) -> PathBuf {
        self.run_dir().join(filename)
    }

    /// Where the detector wrote the label file for `filename`.
    pub fn label_path(&self, filename: &str) -> PathBuf {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        self.run_dir().join("labels").join(format!("{stem}.txt"))
    }

    /// Copy the annotated output image for `filename` into `dest_dir`.
    pub fn collect_output(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, DetectorError> {
        let produced = self.output_image(filename);
        if !produced.exists() {
            return Err(DetectorError::MissingOutput(produced));
        }
        let dest = dest_dir.join(filename);
        std::fs::copy(&produced, &dest)?;
        Ok(dest)
    }
}

/// Parse a label file: one detection per line, six whitespace-separated
/// fields (class id, normalized center x/y, width, height, confidence).
///
/// A missing file means the detector found nothing.
pub fn parse_label_file(path: &Path) -> Result<Vec<LabelDetection>, DetectorError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(parse_labels(&content))
}

fn parse_labels(content: &str) -> Vec<LabelDetection> {
    let mut detections = Vec::new();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 6 {
            continue;
        }

        let values: Option<Vec<f64>> =
            parts[1..].iter().map(|p| p.parse::<f64>().ok()).collect();
        let Some(values) = values else { continue };

        detections.push(LabelDetection {
            class_id: parts[0].to_string(),
            x_center: round3(values[0]),
            y_center: round3(values[1]),
            width: round3(values[2]),
            height: round3(values[3]),
            confidence: round3(values[4]),
        });
    }
    detections
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
