//! Connection lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a managed channel.
///
/// Exactly one value is active at any instant. The manager starts in
/// [`Idle`](Self::Idle) and never returns to it; every later rest state is
/// [`Closed`](Self::Closed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Constructed, no establishment attempted yet.
    #[default]
    Idle,
    /// An establishment attempt is in flight.
    Connecting,
    /// The channel is open and the heartbeat is running.
    Open,
    /// A manual disconnect is closing the channel.
    Closing,
    /// No channel. A reconnect may be pending.
    Closed,
}

impl ConnectionState {
    /// True while an establishment attempt is in flight or the channel is open.
    ///
    /// `connect()` is a no-op in these states.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn only_connecting_and_open_are_active() {
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Open.is_active());
        assert!(!ConnectionState::Idle.is_active());
        assert!(!ConnectionState::Closing.is_active());
        assert!(!ConnectionState::Closed.is_active());
    }

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
        assert_eq!(
            serde_json::to_string(&ConnectionState::Open).unwrap(),
            r#""open""#
        );
    }
}
