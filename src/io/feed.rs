//! Remote alert feed client and refresh poller
//!
//! The feed returns a JSON array of alert records. Entries are decoded
//! individually so one malformed record never poisons the whole refresh.
//! A failed fetch leaves the store at its last good snapshot; the failure is
//! logged and the next cycle retries.

use crate::domain::types::{Alert, SymptomReport};
use crate::infra::metrics::Metrics;
use crate::services::engine::EngineEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum FeedError {
    /// Network or protocol failure talking to the remote service
    Transport(reqwest::Error),
    /// Non-success HTTP status
    Status(u16),
    /// Response body did not decode into the expected shape
    Decode(serde_json::Error),
    /// Response decoded but failed field validation
    Invalid(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Transport(e) => write!(f, "transport error: {e}"),
            FeedError::Status(code) => write!(f, "unexpected status {code}"),
            FeedError::Decode(e) => write!(f, "decode error: {e}"),
            FeedError::Invalid(reason) => write!(f, "invalid response: {reason}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Transport(e)
    }
}

/// HTTP client for the remote health alert service
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, FeedError> {
        let http =
            reqwest::Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Fetch the current remote alert set.
    ///
    /// Malformed entries are rejected individually and logged; the returned
    /// vector contains only validated alerts, in feed order.
    pub async fn fetch_alerts(&self) -> Result<Vec<Alert>, FeedError> {
        let resp = self.http.get(format!("{}/alerts", self.base_url)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let raw: Vec<serde_json::Value> = resp.json().await?;
        Ok(decode_entries(raw))
    }

    /// Submit a symptom report; success returns the server-confirmed alert
    pub async fn submit_report(&self, report: &SymptomReport) -> Result<Alert, FeedError> {
        let resp = self
            .http
            .post(format!("{}/submit-report", self.base_url))
            .json(report)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let value: serde_json::Value = resp.json().await?;
        let alert: Alert = serde_json::from_value(value).map_err(FeedError::Decode)?;
        alert.validate().map_err(FeedError::Invalid)?;
        Ok(alert)
    }
}

/// Decode feed entries one by one, dropping and logging rejects
pub fn decode_entries(raw: Vec<serde_json::Value>) -> Vec<Alert> {
    let mut alerts = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<Alert>(value) {
            Ok(alert) => match alert.validate() {
                Ok(()) => alerts.push(alert),
                Err(reason) => {
                    warn!(id = %alert.id, reason = %reason, "feed_entry_rejected");
                }
            },
            Err(e) => {
                warn!(error = %e, "feed_entry_undecodable");
            }
        }
    }
    alerts
}

/// Periodic feed refresh task
///
/// Fetches on a fixed interval (first fetch immediately) and forwards each
/// snapshot to the engine. Failures are swallowed with a log line; the store
/// keeps its last good snapshot until the next successful cycle.
pub struct FeedPoller {
    client: FeedClient,
    interval: Duration,
    events_tx: mpsc::Sender<EngineEvent>,
    metrics: Arc<Metrics>,
}

impl FeedPoller {
    pub fn new(
        client: FeedClient,
        interval: Duration,
        events_tx: mpsc::Sender<EngineEvent>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { client, interval, events_tx, metrics }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.client.fetch_alerts().await {
                        Ok(alerts) => {
                            self.metrics.record_feed_refresh();
                            debug!(count = alerts.len(), "feed_refreshed");
                            if self.events_tx.send(EngineEvent::FeedSnapshot(alerts)).await.is_err() {
                                return; // Engine gone
                            }
                        }
                        Err(e) => {
                            self.metrics.record_feed_failure();
                            warn!(error = %e, "feed_refresh_failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("feed_poller_shutdown");
                        return;
                    }
                }
            }
        }
    }
}
