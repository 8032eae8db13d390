//! Integration tests for backoff timing and budget accounting.

mod support;

use std::time::Duration;

use chatlink::domain::{close_code, ConnectionError, ConnectionEvent};
use chatlink::testkit::config;
use chatlink::testkit::events::{next_event, stays_quiet};
use chatlink::testkit::transport::{OpenOutcome, ScriptedTransport};
use tokio::time::Instant;

use support::{connected, reconnecting};

#[tokio::test(start_paused = true)]
async fn backoff_doubles_until_budget_is_spent() {
    let mut outcomes = vec![OpenOutcome::Accept];
    outcomes.extend((0..5).map(|_| OpenOutcome::refuse()));
    let transport = ScriptedTransport::new().with_outcomes(outcomes);
    let (_manager, mut events, peer) = connected(&config::reconnecting(5, 1000), &transport).await;

    peer.drop_connection(close_code::ABNORMAL, "network lost");

    let mut delays = Vec::new();
    let mut exhausted = 0;
    let mut armed_at = None;
    loop {
        match next_event(&mut events).await {
            ConnectionEvent::Reconnecting { attempt, delay } => {
                assert_eq!(attempt as usize, delays.len() + 1);
                delays.push(delay);
                armed_at = Some(Instant::now());
            }
            ConnectionEvent::Error(ConnectionError::Transport(_)) => {
                let (armed, delay) = (armed_at.take().unwrap(), *delays.last().unwrap());
                assert_eq!(Instant::now() - armed, delay, "attempt fired off schedule");
            }
            ConnectionEvent::Error(ConnectionError::ReconnectExhausted { max_attempts }) => {
                assert_eq!(max_attempts, 5);
                exhausted += 1;
                break;
            }
            ConnectionEvent::Close { .. } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(
        delays,
        [1000, 2000, 4000, 8000, 16000].map(Duration::from_millis)
    );
    assert!(stays_quiet(&mut events, Duration::from_secs(120)).await);
    assert_eq!(exhausted, 1);
    assert_eq!(transport.open_count(), 6);
}

#[tokio::test(start_paused = true)]
async fn successful_open_resets_backoff() {
    let transport = ScriptedTransport::new().with_outcomes(vec![
        OpenOutcome::Accept,
        OpenOutcome::refuse(),
        OpenOutcome::refuse(),
        OpenOutcome::Accept,
    ]);
    let (manager, mut events, first) = connected(&config::reconnecting(5, 1000), &transport).await;

    first.drop_connection(close_code::ABNORMAL, "network lost");

    let mut scheduled = Vec::new();
    loop {
        match next_event(&mut events).await {
            event @ ConnectionEvent::Reconnecting { .. } => scheduled.push(event),
            ConnectionEvent::Open => break,
            _ => {}
        }
    }
    assert_eq!(
        scheduled,
        vec![
            reconnecting(1, 1000),
            reconnecting(2, 2000),
            reconnecting(3, 4000)
        ]
    );
    assert_eq!(manager.reconnect_attempts(), 0);

    let second = transport.last_peer().unwrap();
    second.drop_connection(close_code::ABNORMAL, "network lost again");
    next_event(&mut events).await;
    assert_eq!(next_event(&mut events).await, reconnecting(1, 1000));
}

#[tokio::test(start_paused = true)]
async fn attempt_counter_is_observable() {
    let transport = ScriptedTransport::new().with_outcomes(vec![
        OpenOutcome::Accept,
        OpenOutcome::refuse(),
    ]);
    let (manager, mut events, peer) = connected(&config::reconnecting(3, 100), &transport).await;
    assert_eq!(manager.reconnect_attempts(), 0);

    peer.drop_connection(1011, "internal error");
    next_event(&mut events).await;
    assert_eq!(next_event(&mut events).await, reconnecting(1, 100));
    assert_eq!(manager.reconnect_attempts(), 1);

    // refused attempt
    next_event(&mut events).await;
    next_event(&mut events).await;
    assert_eq!(next_event(&mut events).await, reconnecting(2, 200));
    assert_eq!(manager.reconnect_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_disconnect_spends_budget() {
    let transport = ScriptedTransport::new();
    let (manager, mut events, _peer) = connected(&config::reconnecting(4, 100), &transport).await;

    manager.disconnect();
    next_event(&mut events).await;

    assert_eq!(manager.reconnect_attempts(), 4);
}
