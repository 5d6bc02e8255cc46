//! Lock-free engine counters
//!
//! Atomic counters updated on the hot paths and read by a periodic reporter
//! task that logs a summary line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

pub struct Metrics {
    started: Instant,
    feed_refreshes: AtomicU64,
    feed_failures: AtomicU64,
    alerts_merged: AtomicU64,
    evaluations: AtomicU64,
    notifications_delivered: AtomicU64,
    notifications_suppressed: AtomicU64,
    position_updates: AtomicU64,
    reports_accepted: AtomicU64,
    reports_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            feed_refreshes: AtomicU64::new(0),
            feed_failures: AtomicU64::new(0),
            alerts_merged: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            notifications_delivered: AtomicU64::new(0),
            notifications_suppressed: AtomicU64::new(0),
            position_updates: AtomicU64::new(0),
            reports_accepted: AtomicU64::new(0),
            reports_failed: AtomicU64::new(0),
        }
    }

    pub fn record_feed_refresh(&self) {
        self.feed_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_failure(&self) {
        self.feed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alerts_merged(&self, added: u64) {
        self.alerts_merged.fetch_add(added, Ordering::Relaxed);
    }

    pub fn record_evaluation(&self, delivered: u64, suppressed: u64) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.notifications_delivered.fetch_add(delivered, Ordering::Relaxed);
        self.notifications_suppressed.fetch_add(suppressed, Ordering::Relaxed);
    }

    pub fn record_position_update(&self) {
        self.position_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_accepted(&self) {
        self.reports_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_failed(&self) {
        self.reports_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot current counters for reporting
    pub fn report(&self, alerts_total: usize, relevant: usize) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started.elapsed().as_secs(),
            feed_refreshes: self.feed_refreshes.load(Ordering::Relaxed),
            feed_failures: self.feed_failures.load(Ordering::Relaxed),
            alerts_merged: self.alerts_merged.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
            position_updates: self.position_updates.load(Ordering::Relaxed),
            reports_accepted: self.reports_accepted.load(Ordering::Relaxed),
            reports_failed: self.reports_failed.load(Ordering::Relaxed),
            alerts_total,
            relevant,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub feed_refreshes: u64,
    pub feed_failures: u64,
    pub alerts_merged: u64,
    pub evaluations: u64,
    pub notifications_delivered: u64,
    pub notifications_suppressed: u64,
    pub position_updates: u64,
    pub reports_accepted: u64,
    pub reports_failed: u64,
    pub alerts_total: usize,
    pub relevant: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = self.uptime_secs,
            alerts_total = self.alerts_total,
            relevant = self.relevant,
            feed_refreshes = self.feed_refreshes,
            feed_failures = self.feed_failures,
            alerts_merged = self.alerts_merged,
            evaluations = self.evaluations,
            delivered = self.notifications_delivered,
            suppressed = self.notifications_suppressed,
            position_updates = self.position_updates,
            reports_accepted = self.reports_accepted,
            reports_failed = self.reports_failed,
            "metrics_summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_feed_refresh();
        metrics.record_feed_refresh();
        metrics.record_feed_failure();
        metrics.record_alerts_merged(3);
        metrics.record_evaluation(2, 1);

        let summary = metrics.report(5, 2);
        assert_eq!(summary.feed_refreshes, 2);
        assert_eq!(summary.feed_failures, 1);
        assert_eq!(summary.alerts_merged, 3);
        assert_eq!(summary.evaluations, 1);
        assert_eq!(summary.notifications_delivered, 2);
        assert_eq!(summary.notifications_suppressed, 1);
        assert_eq!(summary.alerts_total, 5);
        assert_eq!(summary.relevant, 2);
    }
}
