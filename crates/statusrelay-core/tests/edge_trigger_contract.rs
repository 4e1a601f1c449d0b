//! Architectural Contract Test: Edge-Triggered Notification
//!
//! This test verifies that subscribers hear about a maintenance window
//! ending exactly once per maintenance → active flip.
//!
//! Constraints verified:
//! - The first observation never notifies
//! - Sustained states never notify
//! - Each maintenance → active edge notifies every subscriber once
//! - A missing maintenance flag counts as maintenance
//!
//! If this test fails, someone has made the monitor:
//! - Level-triggered (notifying while the service stays active)
//! - Notify on active → maintenance
//! - Notify on startup

mod common;

use common::*;
use statusrelay_core::traits::SubscriberId;
use statusrelay_core::{
    CycleOutcome, MemorySubscriberStore, MonitorEvent, SubscriberStore, Transition,
};
use std::sync::Arc;

async fn notifying_cycles(
    flags: &[bool],
    subscribers: &[i64],
) -> (Vec<usize>, Arc<RecordingTransport>) {
    let provider = Arc::new(ScriptedStatusProvider::from_flags(flags));
    let store = Arc::new(MemorySubscriberStore::with_subscribers(
        subscribers.iter().copied().map(SubscriberId::new),
    ));
    let transport = Arc::new(RecordingTransport::new());
    let (monitor, _events) = monitor_with(provider, store, transport.clone());

    let mut notified = Vec::new();
    for cycle in 0..flags.len() {
        if monitor.poll_once().await.notified() {
            notified.push(cycle);
        }
    }
    (notified, transport)
}

#[tokio::test]
async fn notifies_once_per_maintenance_end() {
    let (notified, transport) =
        notifying_cycles(&[true, true, false, false, true, false], &[1, 2]).await;

    assert_eq!(notified, vec![2, 5], "only the two maintenance → active edges notify");
    assert_eq!(transport.message_chats(), vec![1, 2, 1, 2]);

    let expected = catalog().maintenance_ended();
    for sent in transport.sent() {
        match sent {
            Sent::Message { text, keyboard, .. } => {
                assert_eq!(text, expected);
                assert!(keyboard.is_none(), "notifications carry no keyboard");
            }
            other => panic!("unexpected transport call: {:?}", other),
        }
    }
}

#[tokio::test]
async fn sustained_active_never_notifies() {
    let (notified, transport) = notifying_cycles(&[false, false, false, false], &[1]).await;

    assert!(notified.is_empty());
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn sustained_maintenance_never_notifies() {
    let (notified, transport) = notifying_cycles(&[true, true, true], &[1]).await;

    assert!(notified.is_empty());
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn entering_maintenance_does_not_notify() {
    let (notified, _) = notifying_cycles(&[false, true, true], &[1]).await;

    assert!(notified.is_empty());
}

#[tokio::test]
async fn startup_while_active_is_only_a_baseline() {
    let provider = Arc::new(ScriptedStatusProvider::from_flags(&[false]));
    let store = Arc::new(MemorySubscriberStore::with_subscribers([SubscriberId::new(1)]));
    let transport = Arc::new(RecordingTransport::new());
    let (monitor, mut events) = monitor_with(provider, store, transport.clone());

    let outcome = monitor.poll_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Observed {
            is_maintenance: false,
            transition: Transition::Baseline,
            delivery: None,
        }
    );
    assert_eq!(monitor.last_observed_maintenance().await, Some(false));
    assert_eq!(transport.attempts(), 0);
    assert_eq!(
        drain_events(&mut events),
        vec![MonitorEvent::StatusObserved {
            is_maintenance: false,
            transition: Transition::Baseline,
        }]
    );
}

#[tokio::test]
async fn missing_flag_counts_as_maintenance() {
    let provider = Arc::new(ScriptedStatusProvider::new([
        Step::MissingFlag,
        Step::Maintenance(false),
    ]));
    let store = Arc::new(MemorySubscriberStore::with_subscribers([SubscriberId::new(9)]));
    let transport = Arc::new(RecordingTransport::new());
    let (monitor, _events) = monitor_with(provider, store, transport.clone());

    monitor.poll_once().await;
    assert_eq!(monitor.last_observed_maintenance().await, Some(true));

    assert!(monitor.poll_once().await.notified());
    assert_eq!(transport.message_chats(), vec![9]);
}

#[tokio::test]
async fn notification_reaches_subscribers_present_at_the_edge() {
    let provider = Arc::new(ScriptedStatusProvider::from_flags(&[true, false]));
    let store = Arc::new(MemorySubscriberStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let (monitor, mut events) = monitor_with(provider, store.clone(), transport.clone());

    monitor.poll_once().await;

    // Subscribed during the maintenance window
    store.subscribe(SubscriberId::new(42)).await;

    let outcome = monitor.poll_once().await;
    assert!(outcome.notified());
    assert_eq!(transport.message_chats(), vec![42]);

    let events = drain_events(&mut events);
    assert!(events.contains(&MonitorEvent::NotificationDispatched {
        delivered: 1,
        failed: 0
    }));
}

#[tokio::test]
async fn edge_with_no_subscribers_sends_nothing() {
    let (notified, transport) = notifying_cycles(&[true, false], &[]).await;

    assert_eq!(notified, vec![1], "the edge is still detected");
    assert_eq!(transport.attempts(), 0);
}
