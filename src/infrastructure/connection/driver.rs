//! The connection event loop.
//!
//! One task owns the channel, the heartbeat, and the reconnect timer, and
//! performs every state transition. Handles talk to it over a command
//! queue; it talks back over the event broadcast and the shared snapshot.
//! Because all mutation happens here, commands, inbound frames, heartbeat
//! ticks, and reconnect timers are processed strictly one at a time.
//!
//! Channel establishment runs in its own task so that a disconnect issued
//! while connecting can abort it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace, warn};

use super::heartbeat::{HeartbeatMonitor, Liveness};
use super::manager::Shared;
use super::reconnect::{ReconnectionScheduler, Schedule};
use crate::domain::{
    close_code, CloseInfo, ConnectionError, ConnectionEvent, ConnectionState, ControlKind,
    Envelope, SendError,
};
use crate::error::Result;
use crate::infrastructure::config::ConnectionConfig;
use crate::port::{Channel, Frame, Transport};

const DISCONNECT_REASON: &str = "client disconnect";
const HEARTBEAT_TIMEOUT_REASON: &str = "heartbeat timeout";
const SUPERSEDED_REASON: &str = "superseded";
const CONNECTION_LOST_REASON: &str = "connection lost";

/// Upper bound on sending our own close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type Opening = JoinHandle<Result<Box<dyn Channel>>>;

/// Requests from [`ConnectionManager`](super::ConnectionManager) handles.
pub(crate) enum Command {
    Connect,
    Disconnect,
    Send {
        text: String,
        reply: oneshot::Sender<std::result::Result<(), SendError>>,
    },
    Shutdown,
}

/// What woke the loop.
enum Wake {
    Command(Command),
    /// Every handle is gone.
    Released,
    Opened(Result<Box<dyn Channel>>),
    Frame(Frame),
    HeartbeatDue,
    ReconnectDue,
}

pub(crate) struct Driver {
    transport: Arc<dyn Transport>,
    endpoint: String,
    reconnection: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<ConnectionEvent>,
    shared: Arc<Shared>,

    state: ConnectionState,
    channel: Option<Box<dyn Channel>>,
    opening: Option<Opening>,
    heartbeat: HeartbeatMonitor,
    scheduler: ReconnectionScheduler,
    manual_disconnect: bool,
}

impl Driver {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        endpoint: String,
        config: &ConnectionConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        events: broadcast::Sender<ConnectionEvent>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            transport,
            endpoint,
            reconnection: config.reconnection,
            commands,
            events,
            shared,
            state: ConnectionState::Idle,
            channel: None,
            opening: None,
            heartbeat: HeartbeatMonitor::new(config.heartbeat_interval()),
            scheduler: ReconnectionScheduler::new(
                config.reconnection_attempts,
                config.reconnection_delay(),
            ),
            manual_disconnect: false,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(
            endpoint = %self.endpoint,
            transport = self.transport.name(),
            "Connection driver started"
        );

        loop {
            let wake = tokio::select! {
                biased;
                command = self.commands.recv() => command.map_or(Wake::Released, Wake::Command),
                opened = wait_opening(&mut self.opening) => Wake::Opened(opened),
                frame = next_frame(&mut self.channel) => Wake::Frame(frame),
                () = self.heartbeat.tick() => Wake::HeartbeatDue,
                () = self.scheduler.due() => Wake::ReconnectDue,
            };

            match wake {
                Wake::Command(Command::Connect) => self.connect_requested().await,
                Wake::Command(Command::Disconnect) => self.disconnect().await,
                Wake::Command(Command::Send { text, reply }) => {
                    let result = self.transmit(text).await;
                    let _ = reply.send(result);
                }
                Wake::Command(Command::Shutdown) => {
                    self.disconnect().await;
                    break;
                }
                Wake::Released => {
                    debug!("All handles dropped");
                    self.disconnect().await;
                    break;
                }
                Wake::Opened(Ok(channel)) => self.on_open(channel).await,
                Wake::Opened(Err(e)) => self.on_open_failed(&e),
                Wake::Frame(Frame::Text(text)) => self.on_text(&text).await,
                Wake::Frame(Frame::Undecodable(reason)) => {
                    warn!(reason = %reason, "Dropping undecodable frame");
                    self.emit(ConnectionEvent::Error(ConnectionError::MalformedEnvelope {
                        reason,
                    }));
                }
                Wake::Frame(Frame::Closed(info)) => {
                    self.channel = None;
                    self.on_closed(info);
                }
                Wake::HeartbeatDue => self.on_heartbeat().await,
                Wake::ReconnectDue => {
                    info!(
                        attempt = self.scheduler.attempts_made(),
                        "Reconnect timer fired"
                    );
                    self.open_channel().await;
                }
            }
        }

        debug!("Connection driver stopped");
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    async fn connect_requested(&mut self) {
        self.manual_disconnect = false;
        self.reap_dead_channel();

        if self.state.is_active() {
            debug!(state = %self.state, "Connect ignored, already active");
            self.publish();
            return;
        }

        if self.scheduler.is_exhausted() {
            info!("Retry budget restored by explicit connect");
            self.scheduler.reset();
        }
        if self.scheduler.cancel() {
            info!("Pending reconnect pre-empted by explicit connect");
        }

        self.open_channel().await;
    }

    /// Drops a channel whose socket died before its close frame was read,
    /// so the tracked state agrees with what `state()` already reports.
    fn reap_dead_channel(&mut self) {
        if !self.channel.as_ref().is_some_and(|c| c.probe().is_closed()) {
            return;
        }
        self.channel = None;
        self.heartbeat.stop();
        self.set_state(ConnectionState::Closed);
        info!("Channel found dead on connect");
        self.emit(CloseInfo::abnormal(CONNECTION_LOST_REASON).into());
    }

    async fn disconnect(&mut self) {
        self.manual_disconnect = true;
        if self.scheduler.cancel() {
            info!("Pending reconnect cancelled");
        }
        self.scheduler.exhaust();
        self.heartbeat.stop();

        match self.state {
            ConnectionState::Open => {
                self.set_state(ConnectionState::Closing);
                if let Some(channel) = self.channel.take() {
                    close_quietly(channel, close_code::NORMAL, DISCONNECT_REASON).await;
                }
                self.finish_manual_close();
            }
            ConnectionState::Connecting => {
                if let Some(opening) = self.opening.take() {
                    opening.abort();
                    debug!("Aborted in-flight open");
                }
                self.finish_manual_close();
            }
            ConnectionState::Idle | ConnectionState::Closing | ConnectionState::Closed => {
                self.publish();
            }
        }
    }

    fn finish_manual_close(&mut self) {
        self.set_state(ConnectionState::Closed);
        info!("Disconnected");
        self.emit(ConnectionEvent::Close {
            code: close_code::NORMAL,
            reason: DISCONNECT_REASON.to_string(),
        });
    }

    async fn transmit(&mut self, text: String) -> std::result::Result<(), SendError> {
        if self.state != ConnectionState::Open {
            return Err(SendError::NotConnected);
        }
        let Some(channel) = self.channel.as_mut() else {
            return Err(SendError::NotConnected);
        };

        channel.send(text).await.map_err(|e| {
            warn!(error = %e, "Transmit failed");
            SendError::TransmitFailed(e.to_string())
        })
    }

    // -------------------------------------------------------------------------
    // Channel lifecycle
    // -------------------------------------------------------------------------

    async fn open_channel(&mut self) {
        if self.state.is_active() {
            debug!(state = %self.state, "Open skipped, already active");
            return;
        }

        if let Some(stale) = self.channel.take() {
            debug!("Discarding leftover channel");
            close_quietly(stale, close_code::NORMAL, SUPERSEDED_REASON).await;
        }

        self.set_state(ConnectionState::Connecting);
        info!(
            transport = self.transport.name(),
            attempt = self.scheduler.attempts_made(),
            "Opening channel"
        );

        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        self.opening = Some(tokio::spawn(async move { transport.open(&endpoint).await }));
    }

    async fn on_open(&mut self, channel: Box<dyn Channel>) {
        if self.state != ConnectionState::Connecting {
            debug!(state = %self.state, "Discarding channel opened out of turn");
            close_quietly(channel, close_code::NORMAL, SUPERSEDED_REASON).await;
            return;
        }

        self.scheduler.reset();
        self.heartbeat.start(Instant::now());
        self.channel = Some(channel);
        self.set_state(ConnectionState::Open);
        info!(endpoint = %self.endpoint, "Channel open");
        self.emit(ConnectionEvent::Open);
    }

    fn on_open_failed(&mut self, err: &crate::error::Error) {
        warn!(error = %err, "Failed to open channel");
        self.emit(ConnectionEvent::Error(ConnectionError::Transport(
            err.to_string(),
        )));
        self.on_closed(CloseInfo::abnormal(err.to_string()));
    }

    /// Every closure other than a manual disconnect ends up here.
    fn on_closed(&mut self, info: CloseInfo) {
        let previous = self.state;
        self.heartbeat.stop();
        self.set_state(ConnectionState::Closed);
        info!(
            code = info.code,
            reason = %info.reason,
            previous = %previous,
            "Channel closed"
        );

        let planned = info.is_normal();
        self.emit(info.into());

        if self.manual_disconnect {
            debug!("Manually disconnected, not reconnecting");
            return;
        }
        if planned {
            info!("Normal closure, not reconnecting");
            return;
        }
        if !self.reconnection {
            debug!("Reconnection disabled");
            return;
        }
        if self.scheduler.is_pending() {
            debug!("Reconnect already pending");
            return;
        }

        let schedule = self.scheduler.schedule();
        self.publish();

        match schedule {
            Schedule::Retry { attempt, delay } => {
                info!(
                    attempt,
                    max_attempts = self.scheduler.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Scheduling reconnect"
                );
                self.emit(ConnectionEvent::Reconnecting { attempt, delay });
            }
            Schedule::Exhausted { first_report } => {
                if first_report {
                    let max_attempts = self.scheduler.max_attempts();
                    error!(max_attempts, "Max reconnection attempts reached");
                    self.emit(ConnectionEvent::Error(
                        ConnectionError::ReconnectExhausted { max_attempts },
                    ));
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inbound frames and heartbeat
    // -------------------------------------------------------------------------

    async fn on_text(&mut self, text: &str) {
        match Envelope::decode(text) {
            Ok(Envelope::Control {
                kind: ControlKind::Ping,
                ..
            }) => {
                trace!("Peer ping, answering");
                self.send_control(&Envelope::pong(Utc::now())).await;
            }
            Ok(Envelope::Control {
                kind: ControlKind::Pong,
                ..
            }) => {
                trace!("Pong received");
                self.heartbeat.confirm(Instant::now());
            }
            Ok(Envelope::Application(payload)) => {
                self.emit(ConnectionEvent::Message(payload));
            }
            Err(err) => {
                warn!(error = %err, bytes = text.len(), "Dropping malformed envelope");
                self.emit(ConnectionEvent::Error(err));
            }
        }
    }

    async fn on_heartbeat(&mut self) {
        if self.state != ConnectionState::Open {
            self.heartbeat.stop();
            return;
        }

        let now = Instant::now();
        match self.heartbeat.check(now) {
            Liveness::Expired { silent_for } => {
                warn!(
                    silent_ms = u64::try_from(silent_for.as_millis()).unwrap_or(u64::MAX),
                    "Heartbeat timed out, closing channel"
                );
                if let Some(channel) = self.channel.take() {
                    close_quietly(
                        channel,
                        close_code::HEARTBEAT_TIMEOUT,
                        HEARTBEAT_TIMEOUT_REASON,
                    )
                    .await;
                }
                self.on_closed(CloseInfo::abnormal(HEARTBEAT_TIMEOUT_REASON));
            }
            Liveness::Alive => {
                if self.send_control(&Envelope::ping(Utc::now())).await {
                    self.heartbeat.record_probe(now);
                    trace!("Heartbeat ping sent");
                }
            }
        }
    }

    async fn send_control(&mut self, envelope: &Envelope) -> bool {
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };
        match channel.send(envelope.encode()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send control frame");
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "State transition");
        }
        self.state = state;
        self.publish();
    }

    /// Refresh the snapshot read by handles.
    fn publish(&self) {
        let mut snapshot = self.shared.snapshot.write();
        snapshot.state = self.state;
        snapshot.attempts = self.scheduler.attempts_made();
        snapshot.probe = self.channel.as_ref().map(|channel| channel.probe());
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.events.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

async fn wait_opening(opening: &mut Option<Opening>) -> Result<Box<dyn Channel>> {
    let Some(handle) = opening.as_mut() else {
        return std::future::pending().await;
    };
    let joined = handle.await;
    *opening = None;
    joined.unwrap_or_else(|e| Err(crate::error::Error::Connection(e.to_string())))
}

async fn next_frame(channel: &mut Option<Box<dyn Channel>>) -> Frame {
    match channel.as_mut() {
        Some(channel) => channel.recv().await,
        None => std::future::pending().await,
    }
}

async fn close_quietly(mut channel: Box<dyn Channel>, code: u16, reason: &str) {
    match time::timeout(CLOSE_TIMEOUT, channel.close(code, reason)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, code, "Close frame not delivered"),
        Err(_) => debug!(code, "Timed out sending close frame"),
    }
}
