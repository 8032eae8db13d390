//! Connection manager configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::ClientId;
use crate::error::{ConfigError, Result};

/// Connection, reconnection, and heartbeat settings for one manager.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the chat backend.
    #[serde(default = "default_url")]
    pub url: String,
    /// Append the client id as the last path segment (`.../ws/<client_id>`).
    #[serde(default = "default_true")]
    pub identity_in_path: bool,
    /// Start connecting as soon as the manager is spawned.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    /// Schedule reconnects after unplanned closures.
    #[serde(default = "default_true")]
    pub reconnection: bool,
    /// Maximum reconnect attempts before giving up.
    #[serde(default = "default_reconnection_attempts")]
    pub reconnection_attempts: u32,
    /// Base backoff delay (milliseconds); doubled on each attempt.
    #[serde(default = "default_reconnection_delay_ms")]
    pub reconnection_delay_ms: u64,
    /// Interval between heartbeat probes (milliseconds).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Buffered events per subscriber before the slowest one starts lagging.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_url() -> String {
    "ws://127.0.0.1:8000/ws".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_reconnection_attempts() -> u32 {
    5
}

const fn default_reconnection_delay_ms() -> u64 {
    1000 // 1 second
}

const fn default_heartbeat_interval_ms() -> u64 {
    30_000 // 30 seconds
}

const fn default_event_capacity() -> usize {
    256
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            identity_in_path: default_true(),
            auto_connect: default_true(),
            reconnection: default_true(),
            reconnection_attempts: default_reconnection_attempts(),
            reconnection_delay_ms: default_reconnection_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ConnectionConfig {
    /// Config pointing at `url` with every other setting at its default.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn reconnection_delay(&self) -> Duration {
        Duration::from_millis(self.reconnection_delay_ms)
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Resolve the URL to dial for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or cannot carry path segments.
    pub fn endpoint_for(&self, client_id: &ClientId) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;

        if self.identity_in_path {
            url.path_segments_mut()
                .map_err(|()| ConfigError::InvalidValue {
                    field: "url",
                    reason: "URL cannot carry a path segment".to_string(),
                })?
                .pop_if_empty()
                .push(client_id.as_str());
        }

        Ok(url)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidValue {
            field: "url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue {
                field: "url",
                reason: format!("scheme must be ws or wss, got '{}'", url.scheme()),
            }
            .into());
        }
        if self.reconnection_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnection_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.reconnection_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnection_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
