//! System status log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A periodic system-health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatusEntry {
    /// Database row ID.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_status: String,
    pub sensor_status: String,
    pub last_maintenance: Option<DateTime<Utc>>,
}

impl Default for SystemStatusEntry {
    fn default() -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            disk_usage: 0.0,
            network_status: "connected".to_string(),
            sensor_status: "operational".to_string(),
            last_maintenance: None,
        }
    }
}
