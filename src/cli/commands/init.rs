//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::Database;

/// Initialize the data directory and database.
pub fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    Database::open(&settings.db_path())?;

    println!(
        "{} Initialized RoverWatch in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.db_path().display());
    println!("  Uploads:  {}", settings.uploads_dir().display());

    Ok(())
}
