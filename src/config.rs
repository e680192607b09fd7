//! Configuration management for RoverWatch.
//!
//! Settings come from an optional `roverwatch.toml` (next to the working
//! directory or passed with `--config`), with environment-variable
//! overrides for the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default map center when no located readings exist (Negombo).
pub const DEFAULT_MAP_CENTER: (f64, f64) = (6.0329, 80.2168);

/// Upload size cap: 16 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// External detector tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Directory containing the detector checkout (its `detect.py` and
    /// `runs/` tree).
    pub tool_dir: PathBuf,
    /// Model weights passed to the detector.
    pub weights: PathBuf,
    /// Interpreter used to launch the detector script.
    pub interpreter: String,
    /// Run name under `runs/detect/` (reused across invocations).
    pub run_name: String,
    /// Inference image size.
    pub image_size: u32,
    /// Confidence threshold passed to the detector.
    pub confidence_threshold: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            tool_dir: PathBuf::from("yolov5"),
            weights: PathBuf::from("yolov5/weights/best.pt"),
            interpreter: "python3".to_string(),
            run_name: "rover_detect".to_string(),
            image_size: 640,
            confidence_threshold: 0.01,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base data directory (database, uploads, results).
    pub data_dir: PathBuf,
    /// Database filename inside the data directory.
    pub database_filename: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// External detector configuration.
    pub detector: DetectorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join("roverwatch"))
            .unwrap_or_else(|| PathBuf::from("data"));
        Self {
            data_dir,
            database_filename: "rover.db".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            detector: DetectorSettings::default(),
        }
    }
}

impl Settings {
    /// Build settings rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Self::default()
        }
    }

    /// Load settings from a config file plus environment overrides.
    ///
    /// Resolution order: explicit `--config` path, then `roverwatch.toml`
    /// in the working directory, then built-in defaults. A
    /// `ROVERWATCH_DATA_DIR` environment variable overrides the data
    /// directory either way.
    pub fn load(config_path: Option<&Path>, data_dir_override: Option<&Path>) -> Self {
        let mut settings = match config_path {
            Some(path) => Self::from_file(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config {}: {}", path.display(), e);
                Self::default()
            }),
            None => {
                let default_path = Path::new("roverwatch.toml");
                if default_path.exists() {
                    Self::from_file(default_path).unwrap_or_else(|e| {
                        tracing::warn!("Failed to load roverwatch.toml: {}", e);
                        Self::default()
                    })
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var("ROVERWATCH_DATA_DIR") {
            if !dir.is_empty() {
                settings.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(dir) = data_dir_override {
            settings.data_dir = dir.to_path_buf();
        }

        settings
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Path to the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Directory for stored uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory for detector result images.
    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    /// Create the data directories if they don't exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.uploads_dir())?;
        fs::create_dir_all(self.results_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_settings_are_complete() {
        let settings = Settings::default();
        assert_eq!(settings.database_filename, "rover.db");
        assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(settings.db_path().ends_with("rover.db"));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roverwatch.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/rover"
max_upload_bytes = 1048576

[detector]
interpreter = "python3.11"
image_size = 1280
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path), None);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/rover"));
        assert_eq!(settings.max_upload_bytes, 1_048_576);
        assert_eq!(settings.detector.interpreter, "python3.11");
        assert_eq!(settings.detector.image_size, 1280);
        // Unspecified fields keep their defaults
        assert_eq!(settings.database_filename, "rover.db");
        assert_eq!(settings.detector.run_name, "rover_detect");
    }

    #[test]
    fn data_dir_override_wins() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(None, Some(dir.path()));
        assert_eq!(settings.data_dir, dir.path());

        settings.ensure_directories().unwrap();
        assert!(settings.uploads_dir().is_dir());
        assert!(settings.results_dir().is_dir());
    }
}
