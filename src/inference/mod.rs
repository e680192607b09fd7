//! Simulated detection inference.
//!
//! No model runs here: the input file is opened only to measure image
//! dimensions (or checked for existence, for audio), and detections are
//! generated pseudo-randomly. All randomness flows through an injected
//! [`Rng`] so tests can pin outputs with a seeded generator.

use std::path::{Path, PathBuf};

use image::Rgb;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::models::TelemetryPayload;

/// Errors from the inference layer.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-part body temperature estimates for a thermal detection.
#[derive(Debug, Clone, Serialize)]
pub struct BodyTemperatures {
    pub head: f64,
    pub torso: f64,
    pub limbs: f64,
}

/// One thermal detection.
#[derive(Debug, Clone, Serialize)]
pub struct ThermalDetection {
    /// Pixel bounds: x1, y1, x2, y2.
    pub bbox: [u32; 4],
    pub confidence: f64,
    pub class_id: u32,
    pub label: &'static str,
    pub temperature: f64,
    pub heat_signature: &'static str,
    pub body_parts: BodyTemperatures,
}

/// Result of a thermal scan.
#[derive(Debug, Clone, Serialize)]
pub struct ThermalScan {
    pub detections: Vec<ThermalDetection>,
    pub count: usize,
    pub highest_confidence: f64,
    pub average_temperature: f64,
    pub temperature_range: TemperatureRange,
    pub detection_type: &'static str,
    pub environmental_temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

/// Rough body-size estimate attached to a visual detection.
#[derive(Debug, Clone, Serialize)]
pub struct BiometricEstimate {
    /// Height in cm.
    pub height: f64,
    pub build: &'static str,
}

/// One visual detection.
#[derive(Debug, Clone, Serialize)]
pub struct VisualDetection {
    /// Pixel bounds: x1, y1, x2, y2.
    pub bbox: [u32; 4],
    pub confidence: f64,
    pub class_id: u32,
    pub label: &'static str,
    pub pose: &'static str,
    pub clothing: &'static str,
    pub visibility: &'static str,
    pub movement_status: &'static str,
    /// Meters.
    pub estimated_distance: f64,
    pub threat_level: &'static str,
    pub biometric_estimate: BiometricEstimate,
}

/// Result of a visual scan.
#[derive(Debug, Clone, Serialize)]
pub struct VisualScan {
    pub detections: Vec<VisualDetection>,
    pub count: usize,
    pub highest_confidence: f64,
    pub average_distance: f64,
    pub detection_type: &'static str,
    pub lighting_conditions: &'static str,
    pub weather_impact: &'static str,
}

/// Voice characteristics attached to an audio scan.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceFeatures {
    pub gender: &'static str,
    pub age_estimate: &'static str,
    pub language: &'static str,
    pub emotion: &'static str,
    pub clarity: f64,
    pub background_noise: f64,
    pub speech_rate: &'static str,
    pub volume_level: &'static str,
}

/// Result of a voice scan.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceScan {
    pub detected: bool,
    pub confidence: f64,
    /// Seconds.
    pub duration: f64,
    pub voice_features: VoiceFeatures,
    pub distress_indicators: Vec<&'static str>,
    /// 0-1 scale.
    pub emergency_likelihood: f64,
    pub detection_type: &'static str,
}

/// Simulated detection engine.
pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Scan a thermal image for humans.
    pub fn detect_thermal(
        &self,
        image_path: &Path,
        rng: &mut impl Rng,
    ) -> Result<ThermalScan, InferenceError> {
        let (width, height) = read_dimensions(image_path)?;

        let count = rng.gen_range(0..=3);
        let mut detections = Vec::with_capacity(count);
        for _ in 0..count {
            let bbox = random_bbox(width, height, rng);
            let temperature = rng.gen_range(36.0..38.5);
            detections.push(ThermalDetection {
                bbox,
                confidence: rng.gen_range(0.6..0.95),
                class_id: 0,
                label: "human",
                temperature,
                heat_signature: *["strong", "moderate", "weak"].choose(rng).unwrap(),
                body_parts: BodyTemperatures {
                    head: temperature + rng.gen_range(-0.5..0.5),
                    torso: temperature + rng.gen_range(-1.0..0.5),
                    limbs: temperature + rng.gen_range(-2.0..0.0),
                },
            });
        }

        let temps: Vec<f64> = detections.iter().map(|d| d.temperature).collect();
        let (min_temp, max_temp, avg_temp) = if temps.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                temps.iter().copied().fold(f64::INFINITY, f64::min),
                temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                temps.iter().sum::<f64>() / temps.len() as f64,
            )
        };

        Ok(ThermalScan {
            count: detections.len(),
            highest_confidence: detections
                .iter()
                .map(|d| d.confidence)
                .fold(0.0, f64::max),
            average_temperature: avg_temp,
            temperature_range: TemperatureRange {
                min: min_temp,
                max: max_temp,
            },
            detections,
            detection_type: "thermal",
            environmental_temperature: rng.gen_range(20.0..35.0),
        })
    }

    /// Scan a visual image for humans.
    pub fn detect_visual(
        &self,
        image_path: &Path,
        rng: &mut impl Rng,
    ) -> Result<VisualScan, InferenceError> {
        let (width, height) = read_dimensions(image_path)?;

        let count = rng.gen_range(0..=2);
        let mut detections = Vec::with_capacity(count);
        for _ in 0..count {
            let bbox = random_bbox(width, height, rng);
            let pose = *["standing", "sitting", "walking", "lying", "crouching"]
                .choose(rng)
                .unwrap();
            let movement_status = *["stationary", "moving", "fast_movement"].choose(rng).unwrap();
            let estimated_distance = rng.gen_range(5.0..100.0);

            detections.push(VisualDetection {
                bbox,
                confidence: rng.gen_range(0.7..0.98),
                class_id: 0,
                label: "human",
                pose,
                clothing: *["dark", "light", "bright", "camouflage", "reflective"]
                    .choose(rng)
                    .unwrap(),
                visibility: "clear",
                movement_status,
                estimated_distance,
                threat_level: assess_threat_level(pose, movement_status, estimated_distance),
                biometric_estimate: BiometricEstimate {
                    height: rng.gen_range(150.0..190.0),
                    build: *["slim", "average", "heavy"].choose(rng).unwrap(),
                },
            });
        }

        let distances: Vec<f64> = detections.iter().map(|d| d.estimated_distance).collect();
        Ok(VisualScan {
            count: detections.len(),
            highest_confidence: detections
                .iter()
                .map(|d| d.confidence)
                .fold(0.0, f64::max),
            average_distance: if distances.is_empty() {
                0.0
            } else {
                distances.iter().sum::<f64>() / distances.len() as f64
            },
            detections,
            detection_type: "visual",
            lighting_conditions: *["good", "poor", "artificial", "natural"].choose(rng).unwrap(),
            weather_impact: *["none", "fog", "rain", "glare"].choose(rng).unwrap(),
        })
    }

    /// Scan an audio file for a human voice.
    pub fn detect_voice(
        &self,
        audio_path: &Path,
        rng: &mut impl Rng,
    ) -> Result<VoiceScan, InferenceError> {
        if !audio_path.exists() {
            return Err(InferenceError::FileNotFound(audio_path.to_path_buf()));
        }

        let detected = rng.gen_range(0..3) < 2;
        let confidence = if detected {
            rng.gen_range(0.5..0.9)
        } else {
            rng.gen_range(0.1..0.3)
        };

        let voice_features = VoiceFeatures {
            gender: *["male", "female", "unknown"].choose(rng).unwrap(),
            age_estimate: *["child", "young_adult", "adult", "elderly", "unknown"]
                .choose(rng)
                .unwrap(),
            language: *["english", "sinhala", "tamil", "unknown"].choose(rng).unwrap(),
            emotion: *["calm", "distressed", "shouting", "whispering", "crying", "panic"]
                .choose(rng)
                .unwrap(),
            clarity: rng.gen_range(0.3..1.0),
            background_noise: rng.gen_range(0.0..0.8),
            speech_rate: *["slow", "normal", "fast", "rapid"].choose(rng).unwrap(),
            volume_level: *["whisper", "normal", "loud", "shouting"].choose(rng).unwrap(),
        };

        let mut distress_indicators = Vec::new();
        if matches!(voice_features.emotion, "distressed" | "crying" | "panic") {
            distress_indicators.push("emotional_stress");
            distress_indicators.push("potential_emergency");
        }
        if voice_features.volume_level == "shouting" {
            distress_indicators.push("elevated_voice");
        }
        if voice_features.speech_rate == "rapid" {
            distress_indicators.push("rapid_speech");
        }

        Ok(VoiceScan {
            detected,
            confidence,
            duration: rng.gen_range(1.0..10.0),
            emergency_likelihood: distress_indicators.len() as f64 / 4.0,
            voice_features,
            distress_indicators,
            detection_type: "audio",
        })
    }

    /// Draw detection boxes into a `_processed` copy of the image.
    ///
    /// Returns the path of the annotated copy.
    pub fn annotate_image(
        &self,
        image_path: &Path,
        boxes: &[([u32; 4], Rgb<u8>)],
    ) -> Result<PathBuf, InferenceError> {
        let mut img = image::open(image_path)?.to_rgb8();
        let (width, height) = img.dimensions();

        for &(bbox, color) in boxes {
            let [x1, y1, x2, y2] = bbox;
            let x2 = x2.min(width.saturating_sub(1));
            let y2 = y2.min(height.saturating_sub(1));
            for t in 0..3u32 {
                for x in x1..=x2 {
                    img.put_pixel(x, (y1 + t).min(height - 1), color);
                    img.put_pixel(x, y2.saturating_sub(t), color);
                }
                for y in y1..=y2 {
                    img.put_pixel((x1 + t).min(width - 1), y, color);
                    img.put_pixel(x2.saturating_sub(t), y, color);
                }
            }
        }

        let output_path = processed_path(image_path);
        img.save(&output_path)?;
        Ok(output_path)
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Box color by threat level and confidence.
pub fn box_color(threat_level: Option<&str>, confidence: f64) -> Rgb<u8> {
    match threat_level {
        Some("high") => Rgb([255, 0, 0]),
        Some("medium") => Rgb([255, 165, 0]),
        _ if confidence > 0.8 => Rgb([0, 255, 0]),
        _ if confidence > 0.6 => Rgb([255, 255, 0]),
        _ => Rgb([255, 0, 0]),
    }
}

/// Threat score from pose, movement and distance.
pub fn assess_threat_level(pose: &str, movement: &str, distance: f64) -> &'static str {
    let mut score = 0;

    match pose {
        "crouching" | "lying" => score += 2,
        "standing" => score += 1,
        _ => {}
    }

    match movement {
        "fast_movement" => score += 3,
        "moving" => score += 1,
        _ => {}
    }

    if distance < 10.0 {
        score += 2;
    } else if distance < 25.0 {
        score += 1;
    }

    if score >= 5 {
        "high"
    } else if score >= 3 {
        "medium"
    } else {
        "low"
    }
}

/// Generate a synthetic telemetry payload for testing, wandering around
/// the default search area.
pub fn synthetic_payload(rng: &mut impl Rng) -> TelemetryPayload {
    TelemetryPayload {
        latitude: 6.0329 + rng.gen_range(-0.01..0.01),
        longitude: 80.2168 + rng.gen_range(-0.01..0.01),
        front_distance: rng.gen_range(10.0..200.0),
        back_distance: rng.gen_range(10.0..200.0),
        motion_detected: rng.gen_bool(0.5),
        battery_level: rng.gen_range(20.0..100.0),
        status: (*["Moving", "Scanning", "Stopped", "Charging"].choose(rng).unwrap()).to_string(),
        gps_valid: rng.gen_range(0..3) < 2,
        satellites: rng.gen_range(3..=12),
        altitude: rng.gen_range(0.0..50.0),
        speed: rng.gen_range(0.0..5.0),
        heading: rng.gen_range(0.0..360.0),
        mq2_analog: rng.gen_range(0.0..60.0),
        mq2_digital: rng.gen_range(0..4) == 0,
        mq135_reading: rng.gen_range(50.0..300.0),
        temperature: rng.gen_range(20.0..35.0),
        orientation: rng.gen_range(-180.0..180.0),
        is_stable: rng.gen_range(0..4) < 3,
        sound_detected: rng.gen_bool(0.5),
        distance_traveled: rng.gen_range(0.0..1000.0),
        search_pattern: rng.gen_range(0..=2),
        system_healthy: rng.gen_range(0..4) < 3,
        current_state: (*[
            "Searching",
            "Moving Forward",
            "Scanning",
            "Obstacle Avoidance",
        ]
        .choose(rng)
        .unwrap())
        .to_string(),
        methane_ppm: rng.gen_range(0.0..800.0),
        hydrogen_ppm: rng.gen_range(0.0..500.0),
        lpg_ppm: rng.gen_range(0.0..400.0),
        smoke_ppm: rng.gen_range(0.0..300.0),
        alcohol_ppm: rng.gen_range(0.0..200.0),
        mq2_resistance: rng.gen_range(1000.0..50000.0),
        emergency_mode: rng.gen_range(0..5) == 4,
    }
}

fn read_dimensions(image_path: &Path) -> Result<(u32, u32), InferenceError> {
    if !image_path.exists() {
        return Err(InferenceError::FileNotFound(image_path.to_path_buf()));
    }
    Ok(image::image_dimensions(image_path)?)
}

/// Random box within the image, biased toward the upper-left like the
/// detector the simulation stands in for.
fn random_bbox(width: u32, height: u32, rng: &mut impl Rng) -> [u32; 4] {
    let x1 = rng.gen_range(0..(width / 2).max(1));
    let y1 = rng.gen_range(0..(height / 2).max(1));
    let w = rng.gen_range(50..(width / 3).max(51));
    let h = rng.gen_range(50..(height / 3).max(51));
    [x1, y1, (x1 + w).min(width), (y1 + h).min(height)]
}

fn processed_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = image_path
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "png".to_string());
    image_path.with_file_name(format!("{stem}_processed.{ext}"))
}
