//! Data models for RoverWatch.

mod alert;
mod detection;
mod reading;
mod status;

pub use alert::{AlertSeverity, EmergencyAlert, GasAlertLevel, GasEvent};
pub use detection::{Detection, MediaKind, UploadRecord};
pub use reading::{RobotReading, TelemetryPayload};
pub use status::SystemStatusEntry;
