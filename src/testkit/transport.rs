//! In-memory [`Transport`] for driving the manager from tests.
//!
//! - [`ScriptedTransport`]: pops a scripted [`OpenOutcome`] per `open()`
//!   (defaults to [`OpenOutcome::Accept`] when the script runs out) and
//!   records every channel it hands out.
//! - [`PeerHandle`]: the server's end of an accepted channel. Push frames,
//!   drop the connection, inspect what the client sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::{CloseInfo, ControlKind, Envelope};
use crate::error::{Error, Result};
use crate::port::{Channel, ChannelProbe, Frame, Transport};

/// Scripted result of one `open()` call.
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    Accept,
    Refuse(String),
}

impl OpenOutcome {
    pub fn refuse() -> Self {
        Self::Refuse("connection refused".to_string())
    }
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<OpenOutcome>,
    peers: Vec<PeerHandle>,
    urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Clones share the script, counters, and recorded peers.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    open_count: Arc<AtomicU32>,
    open_delay: Duration,
    auto_pong: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(self, outcomes: Vec<OpenOutcome>) -> Self {
        self.script.lock().unwrap().outcomes = outcomes.into();
        self
    }

    /// Delay every `open()` by `delay` before resolving.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Accepted peers answer heartbeat pings automatically.
    pub fn with_auto_pong(mut self) -> Self {
        self.auto_pong = true;
        self
    }

    /// Append outcomes to the remaining script.
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = OpenOutcome>) {
        self.script.lock().unwrap().outcomes.extend(outcomes);
    }

    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Peers of every accepted channel, oldest first.
    pub fn peers(&self) -> Vec<PeerHandle> {
        self.script.lock().unwrap().peers.clone()
    }

    pub fn last_peer(&self) -> Option<PeerHandle> {
        self.script.lock().unwrap().peers.last().cloned()
    }

    /// URLs passed to `open()`, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.script.lock().unwrap().urls.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn Channel>> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        let mut script = self.script.lock().unwrap();
        script.urls.push(url.to_string());
        match script.outcomes.pop_front().unwrap_or(OpenOutcome::Accept) {
            OpenOutcome::Refuse(reason) => Err(Error::Connection(reason)),
            OpenOutcome::Accept => {
                let (peer, channel) = PeerHandle::pair(self.auto_pong);
                script.peers.push(peer);
                Ok(Box::new(channel))
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// PeerHandle / ScriptedChannel
// ---------------------------------------------------------------------------

/// The remote end of one scripted channel.
#[derive(Clone)]
pub struct PeerHandle {
    inbound: mpsc::UnboundedSender<Frame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_with: Arc<Mutex<Option<CloseInfo>>>,
    fail_sends: Arc<AtomicBool>,
    auto_pong: Arc<AtomicBool>,
    probe: ChannelProbe,
}

impl PeerHandle {
    fn pair(auto_pong: bool) -> (Self, ScriptedChannel) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let peer = Self {
            inbound: inbound_tx.clone(),
            sent: Arc::default(),
            closed_with: Arc::default(),
            fail_sends: Arc::default(),
            auto_pong: Arc::new(AtomicBool::new(auto_pong)),
            probe: ChannelProbe::new(),
        };
        let channel = ScriptedChannel {
            inbound: inbound_rx,
            loopback: inbound_tx,
            peer: peer.clone(),
        };
        (peer, channel)
    }

    /// Deliver a raw text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.inbound.send(Frame::Text(text.into()));
    }

    /// Deliver a binary frame, decoded the way the WebSocket adapter does.
    pub fn send_binary(&self, data: Vec<u8>) {
        let frame = match String::from_utf8(data) {
            Ok(text) => Frame::Text(text),
            Err(e) => Frame::Undecodable(e.utf8_error().to_string()),
        };
        let _ = self.inbound.send(frame);
    }

    pub fn send_json(&self, value: &Value) {
        self.send_text(value.to_string());
    }

    pub fn ping(&self) {
        self.send_text(Envelope::ping(Utc::now()).encode());
    }

    pub fn pong(&self) {
        self.send_text(Envelope::pong(Utc::now()).encode());
    }

    /// Server-side close with `code`.
    pub fn drop_connection(&self, code: u16, reason: &str) {
        self.probe.mark_closed();
        let _ = self.inbound.send(Frame::Closed(CloseInfo::new(code, reason)));
    }

    /// Kill the socket without delivering any close notification.
    pub fn mark_dead(&self) {
        self.probe.mark_closed();
    }

    pub fn set_auto_pong(&self, enabled: bool) {
        self.auto_pong.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Every frame the client transmitted, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Transmitted frames that are not heartbeat control.
    pub fn sent_payloads(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .filter_map(|text| serde_json::from_str::<Value>(text).ok())
            .filter(|value| ControlKind::of(value).is_none())
            .collect()
    }

    pub fn sent_count(&self, kind: ControlKind) -> usize {
        self.sent()
            .iter()
            .filter_map(|text| serde_json::from_str::<Value>(text).ok())
            .filter(|value| ControlKind::of(value) == Some(kind))
            .count()
    }

    /// How the client closed this channel, if it did.
    pub fn closed_with(&self) -> Option<CloseInfo> {
        self.closed_with.lock().unwrap().clone()
    }
}

/// Client end handed to the manager.
pub struct ScriptedChannel {
    inbound: mpsc::UnboundedReceiver<Frame>,
    loopback: mpsc::UnboundedSender<Frame>,
    peer: PeerHandle,
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn send(&mut self, text: String) -> Result<()> {
        if self.peer.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted send failure".to_string()));
        }

        let is_ping = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|value| ControlKind::of(&value))
            == Some(ControlKind::Ping);
        self.peer.sent.lock().unwrap().push(text);

        if is_ping && self.peer.auto_pong.load(Ordering::SeqCst) {
            let _ = self
                .loopback
                .send(Frame::Text(Envelope::pong(Utc::now()).encode()));
        }
        Ok(())
    }

    async fn recv(&mut self) -> Frame {
        self.inbound
            .recv()
            .await
            .unwrap_or_else(|| Frame::Closed(CloseInfo::abnormal("peer gone")))
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        *self.peer.closed_with.lock().unwrap() = Some(CloseInfo::new(code, reason));
        self.peer.probe.mark_closed();
        Ok(())
    }

    fn probe(&self) -> ChannelProbe {
        self.peer.probe.clone()
    }
}
