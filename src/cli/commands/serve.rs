//! Server commands.

use console::style;

use crate::config::Settings;
use crate::repository::Database;

/// Start the dashboard server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind, 5002)?;

    println!("{} Preparing database...", style("→").cyan());
    settings.ensure_directories()?;
    match Database::open(&settings.db_path()) {
        Ok(_) => println!("  {} Database ready", style("✓").green()),
        Err(e) => {
            eprintln!("  {} Migration failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Database migration failed: {}", e));
        }
    }

    println!(
        "{} Starting RoverWatch dashboard at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Start the detection upload app.
pub async fn cmd_detector(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind, 5001)?;

    println!(
        "{} Starting detection upload app at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Detector tool: {}", settings.detector.tool_dir.display());
    println!("  Press Ctrl+C to stop");

    crate::server::serve_detector(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "5002" -> 127.0.0.1:5002
/// - Just a host: "0.0.0.0" -> 0.0.0.0:<default>
/// - Host and port: "0.0.0.0:5002" -> 0.0.0.0:5002
fn parse_bind_address(bind: &str, default_port: u16) -> anyhow::Result<(String, u16)> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    // Must be just a host, use the default port
    Ok((bind.to_string(), default_port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_forms() {
        assert_eq!(
            parse_bind_address("8080", 5002).unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0", 5002).unwrap(),
            ("0.0.0.0".to_string(), 5002)
        );
        assert_eq!(
            parse_bind_address("10.0.0.5:9000", 5002).unwrap(),
            ("10.0.0.5".to_string(), 9000)
        );
    }
}
