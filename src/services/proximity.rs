//! Relevance computation
//!
//! An alert is relevant when the observer sits within its affected radius.
//! The computation is a full pass over the current snapshot; at this scale
//! (tens of alerts) there is nothing to gain from incremental diffing, and a
//! stale snapshot or position is corrected by the next recomputation.

use crate::domain::geo::is_within_radius;
use crate::domain::types::{Alert, ObserverPosition};

/// Subset of `alerts` relevant to the observer, preserving snapshot order.
/// No position means no relevant alerts, not an error.
pub fn relevant_alerts(position: Option<&ObserverPosition>, alerts: &[Alert]) -> Vec<Alert> {
    let Some(pos) = position else {
        return Vec::new();
    };

    let observer = pos.coordinates();
    alerts.iter().filter(|alert| is_within_radius(observer, alert)).cloned().collect()
}
