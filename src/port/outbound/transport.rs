//! Transport port for the managed channel.
//!
//! A [`Transport`] opens channels; a [`Channel`] is one live connection. The
//! manager recreates the channel on every reconnect attempt, so
//! implementations should keep no state in the channel that must outlive it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::CloseInfo;
use crate::error::Error;

/// One inbound frame, already reduced to what the manager cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload (JSON envelope).
    Text(String),
    /// A payload that could not be read as text. The channel stays usable.
    Undecodable(String),
    /// The channel ended. No further frames follow.
    Closed(CloseInfo),
}

/// Shared view of whether a channel's underlying socket has gone away.
///
/// The channel marks the probe when it observes the close; the manager
/// consults it in `state()` so a close that has not been processed yet is
/// still reported truthfully.
#[derive(Debug, Clone, Default)]
pub struct ChannelProbe {
    closed: Arc<AtomicBool>,
}

impl ChannelProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Opens channels to the chat backend.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish a new channel to `url`.
    async fn open(&self, url: &str) -> Result<Box<dyn Channel>, Error>;

    /// Human-readable transport name for logging.
    fn name(&self) -> &'static str;
}

/// A single live bidirectional channel.
///
/// `recv` must be cancel-safe: the manager polls it inside `select!` and may
/// drop the future when another event wins.
#[async_trait]
pub trait Channel: Send {
    /// Transmit one complete text frame.
    async fn send(&mut self, text: String) -> Result<(), Error>;

    /// Wait for the next frame. After [`Frame::Closed`] the channel is spent.
    async fn recv(&mut self) -> Frame;

    /// Close with the given code and reason.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), Error>;

    /// Probe reporting the underlying socket's liveness.
    fn probe(&self) -> ChannelProbe;
}
