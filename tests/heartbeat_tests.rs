//! Integration tests for heartbeat liveness detection.

mod support;

use std::time::Duration;

use chatlink::domain::{close_code, ConnectionEvent, ConnectionState, ControlKind};
use chatlink::testkit::config;
use chatlink::testkit::events::{self, next_event, stays_quiet};
use chatlink::testkit::transport::ScriptedTransport;
use serde_json::json;
use tokio::time::Instant;

use support::{assert_close, connected, reconnecting};

#[tokio::test(start_paused = true)]
async fn silent_peer_is_closed_after_two_missed_intervals() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, peer) = connected(&config::heartbeat(1000), &transport).await;
    let opened = Instant::now();

    assert_close(&next_event(&mut events).await, 1006, "heartbeat timeout");
    assert_eq!(Instant::now() - opened, Duration::from_millis(3000));
    assert_eq!(peer.sent_count(ControlKind::Ping), 2);

    let closed = peer.closed_with().expect("client closed the channel");
    assert_eq!(closed.code, close_code::HEARTBEAT_TIMEOUT);
    assert_eq!(closed.reason, "heartbeat timeout");

    assert_eq!(next_event(&mut events).await, reconnecting(1, 1000));
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Open);
    assert_eq!(transport.peers().len(), 2);
    assert_eq!(manager.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn answered_pings_keep_channel_open() {
    let transport = ScriptedTransport::new().with_auto_pong();
    let (manager, mut events, peer) = connected(&config::heartbeat(1000), &transport).await;
    let opened = Instant::now();

    assert!(stays_quiet(&mut events, Duration::from_millis(10_500)).await);
    assert_eq!(peer.sent_count(ControlKind::Ping), 10);
    assert_eq!(manager.state(), ConnectionState::Open);

    peer.set_auto_pong(false);
    assert_close(&next_event(&mut events).await, 1006, "heartbeat timeout");
    assert_eq!(Instant::now() - opened, Duration::from_secs(13));
}

#[tokio::test(start_paused = true)]
async fn inbound_traffic_alone_does_not_prove_liveness() {
    let transport = ScriptedTransport::new();
    let (_manager, mut events, peer) = connected(&config::heartbeat(1000), &transport).await;
    let opened = Instant::now();

    for n in 0..5 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        peer.send_json(&json!({ "content": n }));
    }

    let close = events::wait_for(&mut events, |event| {
        matches!(event, ConnectionEvent::Close { .. })
    })
    .await;
    assert_close(&close, 1006, "heartbeat timeout");
    assert_eq!(Instant::now() - opened, Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn remote_ping_is_answered_with_pong() {
    let transport = ScriptedTransport::new();
    let (_manager, mut events, peer) = connected(&config::heartbeat(60_000), &transport).await;

    peer.ping();
    peer.send_json(&json!({ "content": "marker" }));
    next_event(&mut events).await;

    assert_eq!(peer.sent_count(ControlKind::Pong), 1);
    assert_eq!(peer.sent_count(ControlKind::Ping), 0);
}

#[tokio::test(start_paused = true)]
async fn no_probes_after_disconnect() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, peer) = connected(&config::heartbeat(1000), &transport).await;

    manager.disconnect();
    next_event(&mut events).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(peer.sent_count(ControlKind::Ping), 0);
}
