//! Host lifecycle integration.
//!
//! Translates host signals into connection actions. A host going to the
//! background leaves the channel alone; coming back to the foreground
//! reconnects unless the owner disconnected on purpose; shutting down
//! always disconnects.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::connection::ConnectionManager;
use crate::domain::ConnectionState;

/// Lifecycle signal raised by the hosting environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Host moved to the background.
    Hidden,
    /// Host returned to the foreground.
    Visible,
    /// Host is going away.
    Shutdown,
}

/// What the watcher did in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Ignored,
    Reconnect,
    Disconnect,
}

/// Applies [`HostSignal`]s to a [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct EnvironmentWatcher {
    manager: ConnectionManager,
}

impl EnvironmentWatcher {
    #[must_use]
    pub const fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub fn handle(&self, signal: HostSignal) -> Reaction {
        match signal {
            HostSignal::Hidden => {
                debug!("Host hidden, leaving connection as is");
                Reaction::Ignored
            }
            HostSignal::Visible => {
                let state = self.manager.state();
                if state == ConnectionState::Open {
                    return Reaction::Ignored;
                }
                if self.manager.is_manually_disconnected() {
                    debug!(state = %state, "Host visible, staying disconnected");
                    return Reaction::Ignored;
                }
                info!(state = %state, "Host visible, reconnecting");
                self.manager.connect();
                Reaction::Reconnect
            }
            HostSignal::Shutdown => {
                info!("Host shutting down, disconnecting");
                self.manager.disconnect();
                Reaction::Disconnect
            }
        }
    }

    /// Apply signals until the sender goes away or the host shuts down.
    pub async fn watch(self, mut signals: mpsc::Receiver<HostSignal>) {
        while let Some(signal) = signals.recv().await {
            if self.handle(signal) == Reaction::Disconnect {
                break;
            }
        }
        debug!("Environment watcher stopped");
    }
}
