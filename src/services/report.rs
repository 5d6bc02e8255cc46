//! Symptom report ingestion
//!
//! Validates an observer-authored report, submits it to the remote service,
//! and folds the confirmed alert into the store. Validation happens before
//! any network attempt; a failed submission leaves the caller's report data
//! untouched for retry.

use crate::domain::types::{Alert, SymptomReport, DISTRICTS};
use crate::io::feed::{FeedClient, FeedError};
use crate::services::alert_store::AlertStore;
use crate::services::engine::EngineEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug)]
pub enum ReportError {
    /// Malformed report input; no network call was made
    Validation(&'static str),
    /// The remote service could not be reached or rejected the report
    Transport(FeedError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Validation(reason) => write!(f, "invalid report: {reason}"),
            ReportError::Transport(e) => write!(f, "report submission failed: {e}"),
        }
    }
}

impl std::error::Error for ReportError {}

/// Transport seam for report submission, mockable in tests
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn submit(&self, report: &SymptomReport) -> Result<Alert, FeedError>;
}

#[async_trait]
impl ReportTransport for FeedClient {
    async fn submit(&self, report: &SymptomReport) -> Result<Alert, FeedError> {
        self.submit_report(report).await
    }
}

pub struct ReportIngestion {
    store: Arc<AlertStore>,
    transport: Arc<dyn ReportTransport>,
    events_tx: mpsc::Sender<EngineEvent>,
}

impl ReportIngestion {
    pub fn new(
        store: Arc<AlertStore>,
        transport: Arc<dyn ReportTransport>,
        events_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self { store, transport, events_tx }
    }

    /// Check report fields without touching the network
    pub fn validate(report: &SymptomReport) -> Result<(), &'static str> {
        if report.location.trim().is_empty() {
            return Err("location is empty");
        }
        if !DISTRICTS.contains(&report.location.as_str()) {
            return Err("unrecognized district");
        }
        if report.description.trim().is_empty() {
            return Err("description is empty");
        }
        Ok(())
    }

    /// Submit a report. On success the server-confirmed alert is folded into
    /// the store (first-seen-wins on identity collision) and returned.
    pub async fn submit(&self, report: &SymptomReport) -> Result<Alert, ReportError> {
        Self::validate(report).map_err(ReportError::Validation)?;

        let alert = self.transport.submit(report).await.map_err(ReportError::Transport)?;

        if self.store.add_from_report(alert.clone()) {
            info!(id = %alert.id, location = %report.location, "report_alert_added");
        } else {
            warn!(id = %alert.id, "report_alert_duplicate_identity");
        }

        // Nudge the engine to re-evaluate against the grown set
        let _ = self.events_tx.try_send(EngineEvent::StoreChanged);

        Ok(alert)
    }
}
