//! Helpers for consuming the manager's event stream in tests.
//!
//! Intended for `#[tokio::test(start_paused = true)]`: waits are bounded by
//! [`EVENT_TIMEOUT`] of virtual time, which auto-advances past backoff delays
//! and heartbeat intervals.

use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;

use crate::domain::ConnectionEvent;
use crate::infrastructure::connection::EventReceiver;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Next event, panicking if none arrives in time.
pub async fn next_event(events: &mut EventReceiver) -> ConnectionEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for connection event")
        .expect("event stream closed")
}

/// Skip events until one matches `predicate`, and return it.
pub async fn wait_for<F>(events: &mut EventReceiver, mut predicate: F) -> ConnectionEvent
where
    F: FnMut(&ConnectionEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if predicate(&event) {
            return event;
        }
    }
}

/// Wait for the next `Open`.
pub async fn wait_open(events: &mut EventReceiver) {
    wait_for(events, |event| matches!(event, ConnectionEvent::Open)).await;
}

/// Events already buffered, without waiting.
pub fn drain(events: &mut EventReceiver) -> Vec<ConnectionEvent> {
    let mut drained = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(event),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return drained,
        }
    }
}

/// Whether no event arrives within `window` of virtual time.
pub async fn stays_quiet(events: &mut EventReceiver, window: Duration) -> bool {
    tokio::time::timeout(window, events.recv()).await.is_err()
}
