//! Notification dispatch with at-most-once delivery per alert content version
//!
//! Tracks which (identity, fingerprint) pairs have already been delivered and
//! negotiates platform permission lazily, on the first attempted delivery.
//! The record set grows monotonically for the process lifetime; a re-issued
//! alert with changed content forms a new pair and is delivered once more.

use crate::domain::types::{Alert, AlertId};
use crate::io::notify::{NotificationRequest, NotificationSender};
use crate::io::permission::{PermissionGate, PermissionState};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome counts for one evaluation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluateSummary {
    /// Requests accepted by the notification boundary and recorded
    pub delivered: usize,
    /// Alerts withheld because permission is denied or unresolved
    pub suppressed: usize,
    /// Alerts whose (identity, fingerprint) was already delivered
    pub already_delivered: usize,
}

pub struct NotificationDispatcher {
    /// Monotonic set of delivered (identity, fingerprint) pairs
    delivered: FxHashSet<(AlertId, u64)>,
    permission: Arc<dyn PermissionGate>,
    /// Permission outcome cached after the first negotiation; cleared when
    /// the permission state changes externally
    resolved: Option<PermissionState>,
    notifier: NotificationSender,
}

impl NotificationDispatcher {
    pub fn new(permission: Arc<dyn PermissionGate>, notifier: NotificationSender) -> Self {
        Self { delivered: FxHashSet::default(), permission, resolved: None, notifier }
    }

    /// Evaluate the relevant set, attempting delivery in input order for
    /// every alert content version not yet delivered.
    ///
    /// Idempotent: repeated calls with the same relevant set deliver nothing
    /// new. A request rejected by a full queue is not recorded, so the next
    /// evaluation retries it.
    pub async fn evaluate(&mut self, relevant: &[Alert]) -> EvaluateSummary {
        let mut summary = EvaluateSummary::default();

        for alert in relevant {
            let key = (alert.id.clone(), alert.fingerprint());
            if self.delivered.contains(&key) {
                summary.already_delivered += 1;
                continue;
            }

            match self.resolve_permission().await {
                PermissionState::Granted => {
                    if self.notifier.send(NotificationRequest::from_alert(alert)) {
                        info!(id = %alert.id, title = %alert.title, "notification_delivered");
                        self.delivered.insert(key);
                        summary.delivered += 1;
                    } else {
                        warn!(id = %alert.id, "notification_queue_full");
                    }
                }
                PermissionState::Denied | PermissionState::Undetermined => {
                    debug!(id = %alert.id, "notification_suppressed");
                    summary.suppressed += 1;
                }
            }
        }

        summary
    }

    /// Clear the cached permission outcome after an external change; the
    /// next evaluation re-negotiates and re-examines suppressed alerts.
    pub fn permission_changed(&mut self) {
        self.resolved = None;
    }

    /// Number of recorded deliveries
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Lazily negotiated permission. Queries the gate on first use and
    /// requests at most once while undetermined; the outcome (including a
    /// dismissed prompt) is cached until `permission_changed`.
    async fn resolve_permission(&mut self) -> PermissionState {
        if let Some(state) = self.resolved {
            return state;
        }

        let mut state = self.permission.state().await;
        if state == PermissionState::Undetermined {
            debug!("notification_permission_requesting");
            state = self.permission.request().await;
        }

        info!(state = state.as_str(), "notification_permission_resolved");
        self.resolved = Some(state);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Coordinates, Severity};
    use crate::io::notify::create_notification_channel;
    use crate::io::permission::SharedPermission;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn alert(id: &str, description: &str) -> Alert {
        Alert {
            id: AlertId::from(id),
            title: format!("Alert {id}"),
            location: "Test".to_string(),
            coordinates: Coordinates { lat: 10.0, lng: 76.0 },
            radius_km: 5.0,
            severity: Severity::High,
            issued_at: Utc::now(),
            description: description.to_string(),
            preventive_measures: vec![],
        }
    }

    fn dispatcher_with(
        initial: PermissionState,
        on_request: PermissionState,
        buffer: usize,
    ) -> (NotificationDispatcher, mpsc::Receiver<NotificationRequest>, Arc<SharedPermission>) {
        let gate = Arc::new(SharedPermission::new(initial, on_request));
        let (sender, rx) = create_notification_channel(buffer);
        (NotificationDispatcher::new(gate.clone(), sender), rx, gate)
    }

    #[tokio::test]
    async fn test_evaluate_idempotent() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Granted, PermissionState::Granted, 16);
        let relevant = vec![alert("1", "cases reported")];

        let first = dispatcher.evaluate(&relevant).await;
        assert_eq!(first.delivered, 1);

        let second = dispatcher.evaluate(&relevant).await;
        assert_eq!(second.delivered, 0);
        assert_eq!(second.already_delivered, 1);

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_changed_content_redelivered_once() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Granted, PermissionState::Granted, 16);

        let original = vec![alert("1", "initial advisory")];
        assert_eq!(dispatcher.evaluate(&original).await.delivered, 1);

        let reissued = vec![alert("1", "updated advisory")];
        assert_eq!(dispatcher.evaluate(&reissued).await.delivered, 1);
        assert_eq!(dispatcher.evaluate(&reissued).await.delivered, 0);

        assert_eq!(dispatcher.delivered_count(), 2);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_denied_suppresses_without_record() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Denied, PermissionState::Denied, 16);

        let summary = dispatcher.evaluate(&[alert("1", "advisory")]).await;
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.suppressed, 1);
        assert_eq!(dispatcher.delivered_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lazy_request_resolves_to_grant() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Undetermined, PermissionState::Granted, 16);

        let summary = dispatcher.evaluate(&[alert("1", "advisory")]).await;
        assert_eq!(summary.delivered, 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_external_grant_reenables_suppressed() {
        let (mut dispatcher, mut rx, gate) =
            dispatcher_with(PermissionState::Undetermined, PermissionState::Denied, 16);

        let relevant = vec![alert("1", "advisory")];
        assert_eq!(dispatcher.evaluate(&relevant).await.suppressed, 1);

        // Denial is cached; nothing changes without an external transition
        assert_eq!(dispatcher.evaluate(&relevant).await.suppressed, 1);

        gate.set(PermissionState::Granted);
        dispatcher.permission_changed();

        assert_eq!(dispatcher.evaluate(&relevant).await.delivered, 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_full_queue_retries_next_evaluation() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Granted, PermissionState::Granted, 1);

        let relevant = vec![alert("1", "a"), alert("2", "b")];
        let first = dispatcher.evaluate(&relevant).await;
        assert_eq!(first.delivered, 1);

        // Drain the queue; the dropped request is retried and delivered
        assert!(rx.recv().await.is_some());
        let second = dispatcher.evaluate(&relevant).await;
        assert_eq!(second.delivered, 1);
        assert_eq!(second.already_delivered, 1);
        assert_eq!(dispatcher.delivered_count(), 2);
    }

    #[tokio::test]
    async fn test_delivery_order_follows_input() {
        let (mut dispatcher, mut rx, _gate) =
            dispatcher_with(PermissionState::Granted, PermissionState::Granted, 16);

        let relevant = vec![alert("z", "first"), alert("a", "second")];
        dispatcher.evaluate(&relevant).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.title, "Health Alert: Alert z");
        assert_eq!(second.title, "Health Alert: Alert a");
    }
}
