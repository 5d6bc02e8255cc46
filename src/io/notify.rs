//! Notification egress channel
//!
//! Typed bounded channel between the dispatcher and the platform
//! presentation layer. Delivery is fire-and-forget: `send` uses `try_send`
//! and reports only whether the request was accepted, never waiting for the
//! platform to display anything.

use crate::domain::types::Alert;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;

/// A delivery request handed to the platform notification boundary
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon_ref: String,
}

impl NotificationRequest {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            title: format!("Health Alert: {}", alert.title),
            body: format!("{}\nLocation: {}", alert.description, alert.location),
            icon_ref: "/notification-icon.png".to_string(),
        }
    }
}

/// Sender handle for notification requests
///
/// Clone to share across producers. Non-blocking: a full queue drops the
/// request and the caller decides whether to retry later.
#[derive(Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<NotificationRequest>,
    accepted: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl NotificationSender {
    /// Queue a delivery request. Returns true when the request was accepted.
    pub fn send(&self, request: NotificationRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a notification channel pair.
/// Buffer size bounds how many undisplayed requests may queue up.
pub fn create_notification_channel(
    buffer_size: usize,
) -> (NotificationSender, mpsc::Receiver<NotificationRequest>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (
        NotificationSender {
            tx,
            accepted: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

/// Consume notification requests and log them.
///
/// Stand-in for the platform presentation layer in the daemon binary; a real
/// embedding replaces this task with its own consumer.
pub async fn run_log_sink(
    mut rx: mpsc::Receiver<NotificationRequest>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            request = rx.recv() => {
                match request {
                    Some(req) => {
                        info!(title = %req.title, body = %req.body, "notification_presented");
                    }
                    None => return,
                }
            }
            _ = shutdown.changed() => {
                info!("notification_sink_shutdown");
                return;
            }
        }
    }
}
