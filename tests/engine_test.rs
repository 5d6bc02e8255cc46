//! End-to-end engine scenarios
//!
//! Drives the engine through feed, position, and permission events and
//! asserts on the notification stream and published relevant-set snapshots.

use chrono::Utc;
use healthwatch::domain::seed;
use healthwatch::domain::types::{Alert, AlertId, Coordinates, ObserverPosition, Severity};
use healthwatch::infra::Metrics;
use healthwatch::io::notify::{create_notification_channel, NotificationRequest};
use healthwatch::io::permission::{PermissionState, SharedPermission};
use healthwatch::services::{AlertEngine, AlertStore, EngineEvent, NotificationDispatcher};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

struct Harness {
    engine: AlertEngine,
    relevant_rx: watch::Receiver<Arc<Vec<Alert>>>,
    notify_rx: mpsc::Receiver<NotificationRequest>,
    permission: Arc<SharedPermission>,
    store: Arc<AlertStore>,
}

fn harness(initial: PermissionState, on_request: PermissionState) -> Harness {
    let store = Arc::new(AlertStore::new());
    store.initialize(seed::builtin());

    let permission = Arc::new(SharedPermission::new(initial, on_request));
    let (notifier, notify_rx) = create_notification_channel(16);
    let dispatcher = NotificationDispatcher::new(permission.clone(), notifier);
    let (engine, relevant_rx) =
        AlertEngine::new(store.clone(), dispatcher, Arc::new(Metrics::new()));

    Harness { engine, relevant_rx, notify_rx, permission, store }
}

/// Position inside the Kochi seed alert's radius and nothing else's
fn kochi_position() -> ObserverPosition {
    ObserverPosition { lat: 9.9312, lng: 76.2673, accuracy_m: Some(10.0) }
}

fn feed_alert(id: &str, coordinates: Coordinates, radius_km: f64) -> Alert {
    Alert {
        id: AlertId::from(id),
        title: format!("Feed Alert {id}"),
        location: "Ernakulam".to_string(),
        coordinates,
        radius_km,
        severity: Severity::Medium,
        issued_at: Utc::now(),
        description: "feed-sourced".to_string(),
        preventive_measures: vec![],
    }
}

#[tokio::test]
async fn test_position_update_delivers_relevant_alert_once() {
    let mut h = harness(PermissionState::Granted, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;

    let relevant = h.relevant_rx.borrow().clone();
    assert_eq!(relevant.len(), 1);
    assert_eq!(relevant[0].location, "Kochi");

    let req = h.notify_rx.try_recv().expect("one notification expected");
    assert!(req.title.starts_with("Health Alert: "));
    assert!(h.notify_rx.try_recv().is_err());

    // Same position again: relevant set unchanged, nothing redelivered
    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert_eq!(h.relevant_rx.borrow().len(), 1);
    assert!(h.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_feed_snapshot_grows_relevant_set() {
    let mut h = harness(PermissionState::Granted, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert!(h.notify_rx.try_recv().is_ok());

    // New alert covering the observer arrives from the feed
    let nearby = feed_alert("feed-1", Coordinates { lat: 9.9312, lng: 76.2673 }, 3.0);
    h.engine.process_event(EngineEvent::FeedSnapshot(vec![nearby])).await;

    assert_eq!(h.relevant_rx.borrow().len(), 2);
    let req = h.notify_rx.try_recv().expect("new alert should be delivered");
    assert_eq!(req.title, "Health Alert: Feed Alert feed-1");
    assert!(h.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_feed_duplicate_of_seed_is_not_redelivered() {
    let mut h = harness(PermissionState::Granted, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert!(h.notify_rx.try_recv().is_ok());

    // Feed re-sends the seed alert's identity with different content;
    // first-seen-wins keeps the stored version, so nothing changes
    let seed_id = h.store.current()[1].id.clone();
    let mut duplicate = feed_alert("x", Coordinates { lat: 9.9312, lng: 76.2673 }, 5.0);
    duplicate.id = seed_id;
    h.engine.process_event(EngineEvent::FeedSnapshot(vec![duplicate])).await;

    assert_eq!(h.store.len(), 3);
    assert!(h.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_denied_permission_suppresses_delivery_but_publishes_relevant() {
    let mut h = harness(PermissionState::Denied, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;

    assert_eq!(h.relevant_rx.borrow().len(), 1);
    assert!(h.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_undetermined_permission_requested_on_first_delivery() {
    let mut h = harness(PermissionState::Undetermined, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;

    // The dispatcher requested permission lazily and the grant stuck
    assert!(h.notify_rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_external_grant_enables_suppressed_alert() {
    let mut h = harness(PermissionState::Denied, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert!(h.notify_rx.try_recv().is_err());

    // User flips the setting; the engine is told and re-evaluates
    h.permission.set(PermissionState::Granted);
    h.engine.process_event(EngineEvent::PermissionChanged).await;

    let req = h.notify_rx.try_recv().expect("previously suppressed alert delivered");
    assert!(req.body.contains("Location: Kochi"));
}

#[tokio::test]
async fn test_position_lost_empties_relevant_set() {
    let mut h = harness(PermissionState::Granted, PermissionState::Granted);

    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert_eq!(h.relevant_rx.borrow().len(), 1);

    h.engine.process_event(EngineEvent::PositionLost).await;
    assert!(h.relevant_rx.borrow().is_empty());

    // Coming back into range does not redeliver the already-seen alert
    h.engine.process_event(EngineEvent::Position(kochi_position())).await;
    assert_eq!(h.relevant_rx.borrow().len(), 1);
    h.notify_rx.try_recv().ok(); // drain the initial delivery if still queued
    assert!(h.notify_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_reissued_alert_delivered_once_more() {
    let mut h = harness(PermissionState::Granted, PermissionState::Granted);

    let spot = Coordinates { lat: 10.2, lng: 76.2 };
    let observer = ObserverPosition { lat: 10.2, lng: 76.2, accuracy_m: None };

    h.engine
        .process_event(EngineEvent::FeedSnapshot(vec![feed_alert("r-1", spot, 4.0)]))
        .await;
    h.engine.process_event(EngineEvent::Position(observer)).await;
    assert!(h.notify_rx.try_recv().is_ok());

    // Same identity, changed content: the store keeps the first version, so
    // the fingerprint is unchanged and nothing new is delivered
    let mut reissued = feed_alert("r-1", spot, 4.0);
    reissued.description = "updated guidance".to_string();
    h.engine.process_event(EngineEvent::FeedSnapshot(vec![reissued])).await;
    assert!(h.notify_rx.try_recv().is_err());
}
