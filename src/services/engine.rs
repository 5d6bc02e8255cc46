//! Alert engine event loop
//!
//! Central processor coordinating the alert store, proximity computation,
//! and notification dispatch. Feed refreshes, position updates, report
//! confirmations, and permission changes all arrive as events on one bounded
//! channel; each event is processed to completion before the next, so store
//! merges and dispatcher evaluations are atomic with respect to readers.

use crate::domain::types::{Alert, ObserverPosition};
use crate::infra::metrics::Metrics;
use crate::services::alert_store::AlertStore;
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::proximity::relevant_alerts;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Events driving the engine. Sources are independent and unordered
/// relative to each other.
#[derive(Debug)]
pub enum EngineEvent {
    /// A refreshed remote feed snapshot to merge
    FeedSnapshot(Vec<Alert>),
    /// The store was mutated out-of-band (report ingestion); re-evaluate
    StoreChanged,
    /// New observer position; last value wins
    Position(ObserverPosition),
    /// Position source became unavailable
    PositionLost,
    /// Platform permission state changed externally
    PermissionChanged,
}

pub struct AlertEngine {
    store: Arc<AlertStore>,
    dispatcher: NotificationDispatcher,
    /// Last known observer position; None degrades relevance to empty
    position: Option<ObserverPosition>,
    /// Read-only relevant-set snapshot for the display boundary
    relevant_tx: watch::Sender<Arc<Vec<Alert>>>,
    metrics: Arc<Metrics>,
}

impl AlertEngine {
    pub fn new(
        store: Arc<AlertStore>,
        dispatcher: NotificationDispatcher,
        metrics: Arc<Metrics>,
    ) -> (Self, watch::Receiver<Arc<Vec<Alert>>>) {
        let (relevant_tx, relevant_rx) = watch::channel(Arc::new(Vec::new()));
        (Self { store, dispatcher, position: None, relevant_tx, metrics }, relevant_rx)
    }

    /// Run the engine, consuming events until shutdown or channel close.
    /// After shutdown no further deliveries occur.
    pub async fn run(
        &mut self,
        mut event_rx: mpsc::Receiver<EngineEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(e) => self.process_event(e).await,
                        None => break, // Channel closed
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("engine_shutdown");
                        break;
                    }
                }
            }
        }
    }

    /// Process a single event and re-evaluate the relevant set
    pub async fn process_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::FeedSnapshot(alerts) => {
                let fetched = alerts.len();
                let added = self.store.merge_feed(alerts);
                self.metrics.record_alerts_merged(added as u64);
                debug!(fetched, added, total = self.store.len(), "feed_merged");
            }
            EngineEvent::StoreChanged => {
                debug!(total = self.store.len(), "store_changed");
            }
            EngineEvent::Position(position) => {
                self.position = Some(position);
                self.metrics.record_position_update();
                debug!(lat = position.lat, lng = position.lng, "position_updated");
            }
            EngineEvent::PositionLost => {
                self.position = None;
                info!("position_lost");
            }
            EngineEvent::PermissionChanged => {
                self.dispatcher.permission_changed();
                info!("permission_state_changed");
            }
        }

        self.reevaluate().await;
    }

    /// Recompute the relevant set from the current snapshot and position,
    /// run dispatch, and publish the snapshot for the display boundary.
    async fn reevaluate(&mut self) {
        let snapshot = self.store.current();
        let relevant = relevant_alerts(self.position.as_ref(), &snapshot);

        let summary = self.dispatcher.evaluate(&relevant).await;
        self.metrics.record_evaluation(summary.delivered as u64, summary.suppressed as u64);

        if summary.delivered > 0 || summary.suppressed > 0 {
            debug!(
                relevant = relevant.len(),
                delivered = summary.delivered,
                suppressed = summary.suppressed,
                "relevance_evaluated"
            );
        }

        self.relevant_tx.send_replace(Arc::new(relevant));
    }

    /// Number of alerts currently relevant to the observer
    pub fn relevant_count(&self) -> usize {
        self.relevant_tx.borrow().len()
    }
}
