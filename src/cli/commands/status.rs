//! Status command.

use console::style;

use crate::config::Settings;
use crate::repository::Database;

/// Show database status and the latest reading.
pub fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        println!(
            "{} No database at {} (run `rover init` first)",
            style("!").yellow(),
            db_path.display()
        );
        return Ok(());
    }

    let db = Database::open(&db_path)?;
    let telemetry = db.telemetry();
    let alerts = db.alerts();

    println!("{} RoverWatch status", style("→").cyan());
    println!("  Database: {}", db_path.display());
    println!("  Readings: {}", telemetry.count()?);
    println!("  Unacknowledged alerts: {}", alerts.unacknowledged_count()?);

    match telemetry.latest()? {
        Some(reading) => {
            println!(
                "  Last reading: {} ({})",
                reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
                reading.current_state
            );
            println!(
                "    battery {:.0}%  MQ2 {:.1}  MQ135 {:.0} ppm",
                reading.battery_level, reading.mq2_gas_level, reading.mq135_air_quality
            );
            if reading.emergency_mode {
                println!("    {} EMERGENCY MODE ACTIVE", style("✗").red());
            }
        }
        None => println!("  {} No readings yet", style("!").yellow()),
    }

    Ok(())
}
