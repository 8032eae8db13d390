//! Wire envelopes exchanged over the channel.
//!
//! Every frame is a JSON value. Objects whose `type` is `"ping"` or `"pong"`
//! are control envelopes owned by the heartbeat; everything else is an
//! application payload and is passed through untouched.
//!
//! ```text
//! { "type": "ping", "timestamp": "2024-05-01T12:00:00.000Z" }
//! { "type": "pong", "timestamp": "2024-05-01T12:00:00.012Z" }
//! { "content": "hello", ... }            <- application, opaque
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::event::ConnectionError;

/// Reserved control subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Ping,
    Pong,
}

impl ControlKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }

    /// Identify a control envelope by its `type` field.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("ping") => Some(Self::Ping),
            Some("pong") => Some(Self::Pong),
            _ => None,
        }
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Heartbeat traffic. Never surfaced to the payload consumer.
    Control {
        kind: ControlKind,
        /// Timestamp as sent by the peer, if any.
        timestamp: Option<String>,
    },
    /// Opaque application payload.
    Application(Value),
}

impl Envelope {
    /// Build a `ping` stamped with `at`.
    #[must_use]
    pub fn ping(at: DateTime<Utc>) -> Self {
        Self::control(ControlKind::Ping, at)
    }

    /// Build a `pong` stamped with `at`.
    #[must_use]
    pub fn pong(at: DateTime<Utc>) -> Self {
        Self::control(ControlKind::Pong, at)
    }

    fn control(kind: ControlKind, at: DateTime<Utc>) -> Self {
        Self::Control {
            kind,
            timestamp: Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::MalformedEnvelope`] if the frame is not valid JSON.
    pub fn decode(text: &str) -> Result<Self, ConnectionError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConnectionError::MalformedEnvelope {
                reason: e.to_string(),
            })?;

        Ok(match ControlKind::of(&value) {
            Some(kind) => Self::Control {
                kind,
                timestamp: value
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            },
            None => Self::Application(value),
        })
    }

    /// Encode as a single JSON text frame.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Control { kind, timestamp } => {
                json!({ "type": kind.as_str(), "timestamp": timestamp }).to_string()
            }
            Self::Application(value) => value.to_string(),
        }
    }

    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Control { .. })
    }
}
