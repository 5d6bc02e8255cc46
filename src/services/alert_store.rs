//! Merged alert working set
//!
//! Combines the seed set with remote feed snapshots and report-confirmed
//! alerts, deduplicating by identity. First-seen wins: the seed set is
//! installed first, so a feed entry reusing a seed identity never replaces
//! the seed content.
//!
//! Readers take `Arc` snapshots; every mutation builds the next vector and
//! swaps it in under the write lock, so a reader never observes a partially
//! merged set.

use crate::domain::types::{Alert, AlertId};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

pub struct AlertStore {
    alerts: RwLock<Arc<Vec<Alert>>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self { alerts: RwLock::new(Arc::new(Vec::new())) }
    }

    /// Install the starting alert set, deduplicated first-wins.
    /// Replaces whatever was present; called once at startup.
    pub fn initialize(&self, seed: Vec<Alert>) {
        let mut seen: FxHashSet<AlertId> = FxHashSet::default();
        let mut set = Vec::with_capacity(seed.len());
        for alert in seed {
            if seen.insert(alert.id.clone()) {
                set.push(alert);
            } else {
                debug!(id = %alert.id, "seed_duplicate_dropped");
            }
        }
        *self.alerts.write() = Arc::new(set);
    }

    /// Merge a remote feed snapshot into the working set.
    ///
    /// Existing entries keep their order and content; remote entries with
    /// unseen identities are appended in feed order. Returns the number of
    /// alerts added.
    pub fn merge_feed(&self, remote: Vec<Alert>) -> usize {
        let mut guard = self.alerts.write();
        let current = guard.as_ref();

        let mut seen: FxHashSet<AlertId> = current.iter().map(|a| a.id.clone()).collect();
        let mut merged = current.clone();
        let mut added = 0;

        for alert in remote {
            if seen.insert(alert.id.clone()) {
                merged.push(alert);
                added += 1;
            } else {
                debug!(id = %alert.id, "feed_duplicate_dropped");
            }
        }

        if added > 0 {
            *guard = Arc::new(merged);
        }
        added
    }

    /// Append a single server-confirmed alert, subject to the same dedup
    /// rule. Returns false when the identity is already present.
    pub fn add_from_report(&self, alert: Alert) -> bool {
        let mut guard = self.alerts.write();
        let current = guard.as_ref();

        if current.iter().any(|a| a.id == alert.id) {
            debug!(id = %alert.id, "report_duplicate_dropped");
            return false;
        }

        let mut next = current.clone();
        next.push(alert);
        *guard = Arc::new(next);
        true
    }

    /// Current immutable snapshot of the alert set
    pub fn current(&self) -> Arc<Vec<Alert>> {
        self.alerts.read().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
