#![allow(dead_code)]

use std::time::Duration;

use chatlink::domain::{ConnectionEvent, ConnectionState};
use chatlink::infrastructure::config::ConnectionConfig;
use chatlink::infrastructure::connection::{ConnectionManager, EventReceiver};
use chatlink::testkit::events;
use chatlink::testkit::transport::{PeerHandle, ScriptedTransport};

/// Spawn a manager, connect, and wait for the first `Open`.
pub async fn connected(
    config: &ConnectionConfig,
    transport: &ScriptedTransport,
) -> (ConnectionManager, EventReceiver, PeerHandle) {
    let (manager, mut events) =
        ConnectionManager::spawn(config, transport.clone()).expect("spawn manager");
    manager.connect();
    events::wait_open(&mut events).await;
    let peer = transport.last_peer().expect("accepted peer");
    (manager, events, peer)
}

/// Poll until the manager reports `state`. Bounded in virtual time.
pub async fn wait_state(manager: &ConnectionManager, state: ConnectionState) {
    for _ in 0..1000 {
        if manager.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("manager never reached {state}, stuck at {}", manager.state());
}

pub fn assert_close(event: &ConnectionEvent, code: u16, reason: &str) {
    match event {
        ConnectionEvent::Close {
            code: actual_code,
            reason: actual_reason,
        } => {
            assert_eq!(*actual_code, code, "close code");
            assert_eq!(actual_reason, reason, "close reason");
        }
        other => panic!("expected Close({code}, {reason}), got {other:?}"),
    }
}

pub fn reconnecting(attempt: u32, delay_ms: u64) -> ConnectionEvent {
    ConnectionEvent::Reconnecting {
        attempt,
        delay: Duration::from_millis(delay_ms),
    }
}
