//! Handler for the `check-config` command.

use std::path::Path;

use super::output;
use crate::domain::IdentityProvider;
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Validate configuration without connecting.
pub fn execute(config_path: &Path, config: &Config) -> Result<()> {
    config.validate()?;

    output::section("Configuration Check");
    if config_path.exists() {
        output::field("Config", config_path.display());
    } else {
        output::field("Config", "built-in defaults");
    }
    output::success("Configuration is valid");

    let connection = &config.connection;
    let sample = connection.endpoint_for(IdentityProvider::new().client_id())?;

    output::section("Connection");
    output::field("URL", &connection.url);
    output::field("Endpoint (example)", sample);
    output::field("Auto connect", connection.auto_connect);
    output::field("Reconnection", connection.reconnection);
    output::field("Max attempts", connection.reconnection_attempts);
    output::field(
        "Base delay",
        format!("{}ms", connection.reconnection_delay_ms),
    );
    output::field(
        "Heartbeat interval",
        format!("{}ms", connection.heartbeat_interval_ms),
    );

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", format!("{:?}", config.logging.format).to_lowercase());

    Ok(())
}
