//! Simulate command.

use console::style;

use crate::config::Settings;
use crate::inference::synthetic_payload;
use crate::models::RobotReading;
use crate::repository::Database;

/// Insert synthetic telemetry readings for testing.
pub fn cmd_simulate(settings: &Settings, count: usize) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let db = Database::open(&settings.db_path())?;
    let telemetry = db.telemetry();

    let mut rng = rand::thread_rng();
    let mut emergencies = 0;
    for _ in 0..count {
        let reading = RobotReading::from_payload(synthetic_payload(&mut rng));
        let outcome = telemetry.ingest(&reading)?;
        if outcome.emergency_alert_id.is_some() {
            emergencies += 1;
        }
    }

    println!(
        "{} Simulated {} reading(s), {} emergency alert(s)",
        style("✓").green(),
        count,
        emergencies
    );

    Ok(())
}
