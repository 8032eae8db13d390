//! Public handle to a managed connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

use super::driver::{Command, Driver};
use crate::domain::{
    ClientId, ConnectionEvent, ConnectionState, ControlKind, Envelope, IdentityProvider, SendError,
};
use crate::error::Result;
use crate::infrastructure::config::ConnectionConfig;
use crate::port::{ChannelProbe, Transport};

/// Receiving side of the event stream.
pub type EventReceiver = broadcast::Receiver<ConnectionEvent>;

/// Last state published by the driver.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub(crate) state: ConnectionState,
    pub(crate) attempts: u32,
    pub(crate) probe: Option<ChannelProbe>,
}

/// State shared between handles and the driver.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) snapshot: RwLock<Snapshot>,
    /// Owner intent, written by handles only.
    manual_disconnect: AtomicBool,
}

/// Owns one logical connection to the chat backend.
///
/// Cloning yields another handle to the same connection. The connection is
/// driven by a background task that lives until [`shutdown`](Self::shutdown)
/// is called or every handle has been dropped.
///
/// ```no_run
/// use chatlink::adapter::outbound::WebSocketTransport;
/// use chatlink::domain::ConnectionEvent;
/// use chatlink::infrastructure::config::ConnectionConfig;
/// use chatlink::infrastructure::connection::ConnectionManager;
///
/// # async fn demo() -> chatlink::error::Result<()> {
/// let config = ConnectionConfig::with_url("ws://127.0.0.1:8000/ws");
/// let (manager, mut events) = ConnectionManager::spawn(&config, WebSocketTransport::new())?;
///
/// while let Ok(event) = events.recv().await {
///     if let ConnectionEvent::Open = event {
///         let _ = manager.send(&serde_json::json!({ "content": "hello" })).await;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    identity: IdentityProvider,
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ConnectionEvent>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("client_id", self.identity.client_id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Start a manager with a freshly generated identity.
    ///
    /// Connects immediately when `auto_connect` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[allow(clippy::result_large_err)]
    pub fn spawn<T: Transport>(
        config: &ConnectionConfig,
        transport: T,
    ) -> Result<(Self, EventReceiver)> {
        Self::spawn_with_identity(config, transport, IdentityProvider::new())
    }

    /// Start a manager that presents `identity` to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[allow(clippy::result_large_err)]
    pub fn spawn_with_identity<T: Transport>(
        config: &ConnectionConfig,
        transport: T,
        identity: IdentityProvider,
    ) -> Result<(Self, EventReceiver)> {
        config.validate()?;
        let endpoint = config.endpoint_for(identity.client_id())?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = broadcast::channel(config.event_capacity);
        let shared = Arc::new(Shared::default());

        info!(
            client_id = %identity.client_id(),
            endpoint = %endpoint,
            "Starting connection manager"
        );

        let driver = Driver::new(
            Arc::new(transport),
            endpoint.to_string(),
            config,
            command_rx,
            event_tx.clone(),
            Arc::clone(&shared),
        );
        tokio::spawn(driver.run());

        let manager = Self {
            identity,
            commands: command_tx,
            events: event_tx,
            shared,
        };

        if config.auto_connect {
            manager.connect();
        }

        Ok((manager, event_rx))
    }

    /// Open the channel. No-op while already connecting or open.
    ///
    /// Clears the manual-disconnect flag, pre-empts a pending reconnect
    /// timer, and restores an exhausted retry budget.
    pub fn connect(&self) {
        self.shared.manual_disconnect.store(false, Ordering::SeqCst);
        self.command(Command::Connect);
    }

    /// Close the channel and suppress reconnection until the next [`connect`](Self::connect).
    pub fn disconnect(&self) {
        self.shared.manual_disconnect.store(true, Ordering::SeqCst);
        self.command(Command::Disconnect);
    }

    /// Disconnect and stop the background task. Other handles become inert.
    pub fn shutdown(&self) {
        self.shared.manual_disconnect.store(true, Ordering::SeqCst);
        self.command(Command::Shutdown);
    }

    /// Serialize `payload` and transmit it as one frame.
    ///
    /// Never queues: a payload sent while the channel is not open is rejected.
    ///
    /// # Errors
    ///
    /// - [`SendError::NotConnected`] unless the channel is open
    /// - [`SendError::ReservedType`] if the payload's `type` is `ping` or `pong`
    /// - [`SendError::Serialize`] if the payload cannot be encoded as JSON
    /// - [`SendError::TransmitFailed`] if the channel rejects the frame
    pub async fn send<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> std::result::Result<(), SendError> {
        let value =
            serde_json::to_value(payload).map_err(|e| SendError::Serialize(e.to_string()))?;
        if let Some(kind) = ControlKind::of(&value) {
            return Err(SendError::ReservedType(kind.as_str().to_string()));
        }
        if self.state() != ConnectionState::Open {
            return Err(SendError::NotConnected);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let command = Command::Send {
            text: Envelope::Application(value).encode(),
            reply: reply_tx,
        };
        if self.commands.send(command).is_err() {
            return Err(SendError::NotConnected);
        }

        reply_rx.await.unwrap_or(Err(SendError::NotConnected))
    }

    /// Current state, reconciled with the live socket.
    ///
    /// If the socket has gone away but the driver has not processed the
    /// close yet, this reports `Closed` rather than the stale `Open`.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        let snapshot = self.shared.snapshot.read();
        match (&snapshot.probe, snapshot.state) {
            (Some(probe), ConnectionState::Open | ConnectionState::Closing)
                if probe.is_closed() =>
            {
                ConnectionState::Closed
            }
            (_, state) => state,
        }
    }

    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        self.identity.client_id()
    }

    /// Reconnect attempts made since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.snapshot.read().attempts
    }

    /// Whether the owner last asked to disconnect.
    #[must_use]
    pub fn is_manually_disconnected(&self) -> bool {
        self.shared.manual_disconnect.load(Ordering::SeqCst)
    }

    /// A new receiver that sees events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Connection driver has stopped, command dropped");
        }
    }
}
