//! Integration tests for host lifecycle handling.

mod support;

use std::time::Duration;

use chatlink::domain::{close_code, ConnectionEvent, ConnectionState};
use chatlink::infrastructure::environment::{EnvironmentWatcher, HostSignal, Reaction};
use chatlink::testkit::config;
use chatlink::testkit::events::{next_event, stays_quiet};
use chatlink::testkit::transport::ScriptedTransport;
use tokio::sync::mpsc;
use tokio::time::Instant;

use support::{assert_close, connected, reconnecting};

#[tokio::test(start_paused = true)]
async fn hidden_host_keeps_connection() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, _peer) = connected(&config::connection(), &transport).await;
    let watcher = EnvironmentWatcher::new(manager.clone());

    assert_eq!(watcher.handle(HostSignal::Hidden), Reaction::Ignored);
    assert!(stays_quiet(&mut events, Duration::from_secs(1)).await);
    assert_eq!(manager.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn visible_while_open_is_ignored() {
    let transport = ScriptedTransport::new();
    let (manager, _events, _peer) = connected(&config::connection(), &transport).await;
    let watcher = EnvironmentWatcher::new(manager);

    assert_eq!(watcher.handle(HostSignal::Visible), Reaction::Ignored);
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn visible_after_drop_reconnects_immediately() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, peer) = connected(&config::connection(), &transport).await;
    let watcher = EnvironmentWatcher::new(manager.clone());

    peer.drop_connection(close_code::ABNORMAL, "network lost");
    next_event(&mut events).await;
    assert_eq!(next_event(&mut events).await, reconnecting(1, 1000));

    let woke = Instant::now();
    assert_eq!(watcher.handle(HostSignal::Visible), Reaction::Reconnect);
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Open);
    assert_eq!(Instant::now(), woke);
    assert_eq!(manager.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn visible_with_dead_socket_reconnects_without_waiting_for_heartbeat() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, peer) = connected(&config::heartbeat(30_000), &transport).await;
    let watcher = EnvironmentWatcher::new(manager.clone());

    peer.mark_dead();
    let woke = Instant::now();
    assert_eq!(watcher.handle(HostSignal::Visible), Reaction::Reconnect);

    assert_close(&next_event(&mut events).await, 1006, "connection lost");
    assert_eq!(next_event(&mut events).await, ConnectionEvent::Open);
    assert_eq!(Instant::now(), woke);
    assert_eq!(transport.open_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn visible_after_manual_disconnect_stays_down() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, _peer) = connected(&config::connection(), &transport).await;
    let watcher = EnvironmentWatcher::new(manager.clone());

    manager.disconnect();
    next_event(&mut events).await;

    assert_eq!(watcher.handle(HostSignal::Visible), Reaction::Ignored);
    assert!(stays_quiet(&mut events, Duration::from_secs(60)).await);
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn watch_disconnects_on_shutdown_and_stops() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, peer) = connected(&config::connection(), &transport).await;
    let (signals, receiver) = mpsc::channel(4);
    let watching = tokio::spawn(EnvironmentWatcher::new(manager.clone()).watch(receiver));

    signals.send(HostSignal::Hidden).await.unwrap();
    signals.send(HostSignal::Shutdown).await.unwrap();

    assert_close(&next_event(&mut events).await, 1000, "client disconnect");
    assert_eq!(
        peer.closed_with().map(|info| info.code),
        Some(close_code::NORMAL)
    );
    assert!(manager.is_manually_disconnected());
    watching.await.unwrap();
}
