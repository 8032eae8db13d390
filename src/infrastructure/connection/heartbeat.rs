//! Heartbeat liveness tracking.
//!
//! Long-lived sockets behind proxies and NATs can die without the transport
//! noticing. While the channel is open the monitor ticks every interval; on
//! each tick the driver asks [`HeartbeatMonitor::check`] whether a `pong` has
//! been seen within two intervals, and either sends the next `ping` or
//! force-closes the channel.
//!
//! The ticker only exists between [`start`](HeartbeatMonitor::start) and
//! [`stop`](HeartbeatMonitor::stop); once stopped, [`tick`](HeartbeatMonitor::tick)
//! never resolves, so no probe can fire after the channel leaves `Open`.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Probe bookkeeping. Mutated only by [`HeartbeatMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatRecord {
    /// When the last `ping` went out, if any since the channel opened.
    pub last_probe_sent_at: Option<Instant>,
    /// When the peer last proved it was alive. Never moves backwards.
    pub last_liveness_confirmed_at: Instant,
}

/// Verdict of a liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// No `pong` for longer than the timeout.
    Expired { silent_for: Duration },
}

/// Periodic probe timer plus the [`HeartbeatRecord`] it maintains.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    record: HeartbeatRecord,
    ticker: Option<Interval>,
}

impl HeartbeatMonitor {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            record: HeartbeatRecord {
                last_probe_sent_at: None,
                last_liveness_confirmed_at: Instant::now(),
            },
            ticker: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Silence tolerated before the channel is declared dead: two intervals.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.interval.saturating_mul(2)
    }

    #[must_use]
    pub const fn record(&self) -> HeartbeatRecord {
        self.record
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Begin probing. Opening the channel counts as a liveness confirmation.
    pub fn start(&mut self, now: Instant) {
        self.record.last_probe_sent_at = None;
        self.confirm(now);

        let mut ticker = time::interval_at(now + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    /// Drop the ticker. Takes effect immediately.
    pub fn stop(&mut self) {
        self.ticker = None;
    }

    /// Wait for the next probe time. Pending forever while stopped.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    #[must_use]
    pub fn check(&self, now: Instant) -> Liveness {
        let silent_for = now.saturating_duration_since(self.record.last_liveness_confirmed_at);
        if silent_for > self.timeout() {
            Liveness::Expired { silent_for }
        } else {
            Liveness::Alive
        }
    }

    pub fn record_probe(&mut self, now: Instant) {
        self.record.last_probe_sent_at = Some(now);
    }

    /// Record a `pong`.
    pub fn confirm(&mut self, now: Instant) {
        if now > self.record.last_liveness_confirmed_at {
            self.record.last_liveness_confirmed_at = now;
        }
    }
}
