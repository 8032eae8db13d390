//! Handler for the `run` command.
//!
//! Connects, prints inbound payloads to stdout, and sends each non-empty
//! stdin line as `{"content": <line>}`. Ctrl+C shuts the connection down;
//! on Unix, `SIGUSR1` is treated as the host returning to the foreground.

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::command::RunArgs;
use super::output;
use crate::adapter::outbound::WebSocketTransport;
use crate::domain::{ClientId, ConnectionError, ConnectionEvent, IdentityProvider};
use crate::error::{Error, Result};
use crate::infrastructure::config::{Config, LogFormat};
use crate::infrastructure::connection::ConnectionManager;
use crate::infrastructure::environment::{EnvironmentWatcher, HostSignal};

/// Execute the run command.
pub async fn execute(mut config: Config, args: RunArgs) -> Result<()> {
    apply_run_overrides(&mut config, &args);
    config.validate()?;
    config.init_logging();

    let identity = args
        .client_id
        .map_or_else(IdentityProvider::new, |id| {
            IdentityProvider::with_id(ClientId::new(id))
        });

    // The CLI always connects; auto_connect only matters to embedders.
    let mut connection = config.connection.clone();
    connection.auto_connect = true;

    let (manager, mut events) =
        ConnectionManager::spawn_with_identity(&connection, WebSocketTransport::new(), identity)?;

    output::section("Session");
    output::field("Endpoint", &connection.url);
    output::field("Client ID", manager.client_id());

    let (signal_tx, signal_rx) = mpsc::channel(8);
    tokio::spawn(EnvironmentWatcher::new(manager.clone()).watch(signal_rx));
    forward_visibility_signals(signal_tx.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ConnectionEvent::Message(payload)) => output::message(&payload),
                Ok(ConnectionEvent::Open) => output::status("open", "connected"),
                Ok(ConnectionEvent::Close { code, reason }) => {
                    output::status("closed", &format!("{code} {reason}"));
                    if manager.is_manually_disconnected() {
                        break;
                    }
                }
                Ok(ConnectionEvent::Reconnecting { attempt, delay }) => {
                    output::status(
                        "reconnecting",
                        &format!("attempt {attempt} in {}ms", delay.as_millis()),
                    );
                }
                Ok(ConnectionEvent::Error(ConnectionError::ReconnectExhausted { max_attempts })) => {
                    manager.shutdown();
                    return Err(Error::Connection(format!(
                        "gave up after {max_attempts} reconnection attempts"
                    )));
                }
                Ok(ConnectionEvent::Error(e)) => output::warning(&e.to_string()),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event subscriber lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received (Ctrl+C)");
                let _ = signal_tx.send(HostSignal::Shutdown).await;
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if let Err(e) = manager.send(&json!({ "content": line })).await {
                        output::warning(&format!("message not sent: {e}"));
                    }
                }
                None => {
                    debug!("stdin closed");
                    stdin_open = false;
                }
            },
        }
    }

    manager.shutdown();
    info!("chatlink stopped");
    Ok(())
}

fn apply_run_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref url) = args.url {
        config.connection.url.clone_from(url);
    }
    if let Some(ref level) = args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }
}

#[cfg(unix)]
fn forward_visibility_signals(signals: mpsc::Sender<HostSignal>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut wake = match signal(SignalKind::user_defined1()) {
        Ok(wake) => wake,
        Err(e) => {
            warn!(error = %e, "SIGUSR1 handler unavailable");
            return;
        }
    };
    tokio::spawn(async move {
        while wake.recv().await.is_some() {
            debug!("SIGUSR1 received, treating host as visible");
            if signals.send(HostSignal::Visible).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn forward_visibility_signals(_signals: mpsc::Sender<HostSignal>) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_url_and_logging() {
        let mut config = Config::default();
        let args = RunArgs {
            url: Some("wss://chat.example.com/ws".to_string()),
            log_level: Some("debug".to_string()),
            json_logs: true,
            ..RunArgs::default()
        };

        apply_run_overrides(&mut config, &args);

        assert_eq!(config.connection.url, "wss://chat.example.com/ws");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn no_overrides_keep_config() {
        let mut config = Config::default();
        apply_run_overrides(&mut config, &RunArgs::default());

        assert_eq!(config.connection.url, Config::default().connection.url);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
