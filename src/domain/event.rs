//! Events raised to the payload layer, and the typed failures of the public API.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Standard WebSocket close codes used by the manager.
pub mod close_code {
    /// Normal closure. Manual disconnects and intentional teardown.
    pub const NORMAL: u16 = 1000;
    /// Abnormal closure: the transport dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
    /// Sent to the peer when the heartbeat declares the channel dead.
    pub const HEARTBEAT_TIMEOUT: u16 = 4000;
}

/// How a channel ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Close without a frame (`1006`).
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(close_code::ABNORMAL, reason)
    }

    /// A normal (`1000`) closure is planned and never reconnects.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        self.code == close_code::NORMAL
    }
}

/// Failures reported through [`ConnectionEvent::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The channel could not be established.
    #[error("failed to open channel: {0}")]
    Transport(String),

    /// An inbound frame could not be parsed. The channel stays open.
    #[error("malformed inbound envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// Terminal: the retry budget ran out. Only an explicit `connect()` recovers.
    #[error("max reconnection attempts reached ({max_attempts})")]
    ReconnectExhausted { max_attempts: u32 },
}

/// Why `send()` did not transmit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("not connected")]
    NotConnected,

    /// The channel rejected the frame. Connection state is unchanged.
    #[error("transmit failed: {0}")]
    TransmitFailed(String),

    /// The payload uses a control subtype reserved for the heartbeat.
    #[error("payload type '{0}' is reserved for heartbeat control")]
    ReservedType(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

/// Lifecycle and message events, delivered in the order the channel produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Open,
    /// An application payload. Control envelopes never appear here.
    Message(Value),
    Close {
        code: u16,
        reason: String,
    },
    Error(ConnectionError),
    /// A reconnect timer was armed.
    Reconnecting {
        attempt: u32,
        delay: Duration,
    },
}

impl From<CloseInfo> for ConnectionEvent {
    fn from(info: CloseInfo) -> Self {
        Self::Close {
            code: info.code,
            reason: info.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_1000_is_normal() {
        assert!(CloseInfo::new(close_code::NORMAL, "bye").is_normal());
        assert!(!CloseInfo::abnormal("gone").is_normal());
        assert!(!CloseInfo::new(1011, "server error").is_normal());
    }

    #[test]
    fn close_info_converts_to_close_event() {
        let event: ConnectionEvent = CloseInfo::new(4000, "heartbeat timeout").into();
        assert_eq!(
            event,
            ConnectionEvent::Close {
                code: 4000,
                reason: "heartbeat timeout".into()
            }
        );
    }

    #[test]
    fn errors_render_readable_messages() {
        assert_eq!(SendError::NotConnected.to_string(), "not connected");
        assert_eq!(
            ConnectionError::ReconnectExhausted { max_attempts: 5 }.to_string(),
            "max reconnection attempts reached (5)"
        );
    }
}
