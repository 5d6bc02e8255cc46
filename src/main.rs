//! Healthwatch - public health alert engine
//!
//! Maintains a merged set of health alerts (builtin seed + remote feed +
//! confirmed symptom reports), computes which alerts cover the observer's
//! position, and delivers each relevant alert at most once per content
//! version through the notification boundary.
//!
//! Module structure:
//! - `domain/` - Core types (Alert, Severity, Coordinates), geodesy, seed set
//! - `io/` - External interfaces (feed client, notifications, permission, API)
//! - `services/` - Business logic (engine, store, proximity, dispatch, reports)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use healthwatch::domain::seed;
use healthwatch::infra::{Config, Metrics};
use healthwatch::io::api::{start_api_server, ApiContext};
use healthwatch::io::{create_notification_channel, FeedClient, FeedPoller, SharedPermission};
use healthwatch::services::{AlertEngine, AlertStore, NotificationDispatcher, ReportIngestion};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Healthwatch - disease outbreak alert engine
#[derive(Parser, Debug)]
#[command(name = "healthwatch", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("healthwatch starting");

    // Parse command line arguments using clap
    let args = Args::parse();

    // Load configuration from TOML file
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        feed_base_url = %config.feed_base_url(),
        poll_interval_secs = %config.feed_poll_interval_secs(),
        seed_file = ?config.seed_file(),
        permission_initial = %config.permission_initial().as_str(),
        api_bind_address = %config.api_bind_address(),
        api_port = %config.api_port(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Install the seed alert set before anything else runs
    let store = Arc::new(AlertStore::new());
    store.initialize(seed::load(config.seed_file()));
    info!(seed_alerts = store.len(), "store_initialized");

    let metrics = Arc::new(Metrics::new());

    // Notification egress channel; the daemon consumes it with a log sink
    let (notifier, notify_rx) = create_notification_channel(config.notification_queue_capacity());
    let sink_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        healthwatch::io::notify::run_log_sink(notify_rx, sink_shutdown).await;
    });

    // Permission gate shared between the dispatcher and the local API
    let permission = Arc::new(SharedPermission::new(
        config.permission_initial(),
        config.permission_on_request(),
    ));

    let dispatcher = NotificationDispatcher::new(permission.clone(), notifier);
    let (mut engine, relevant_rx) =
        AlertEngine::new(store.clone(), dispatcher, metrics.clone());

    // Create event channel (bounded for backpressure)
    let (event_tx, event_rx) = mpsc::channel(256);

    // Start feed poller
    let feed_client = FeedClient::new(config.feed_base_url(), config.feed_timeout_ms())?;
    let poller = FeedPoller::new(
        feed_client,
        Duration::from_secs(config.feed_poll_interval_secs()),
        event_tx.clone(),
        metrics.clone(),
    );
    let poller_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        poller.run(poller_shutdown).await;
    });

    // Report ingestion uses its own client so feed timeouts stay independent
    let report_client = FeedClient::new(config.feed_base_url(), config.feed_timeout_ms())?;
    let reports = Arc::new(ReportIngestion::new(
        store.clone(),
        Arc::new(report_client),
        event_tx.clone(),
    ));

    // Start local control API (if port > 0)
    let api_port = config.api_port();
    if api_port > 0 {
        let ctx = ApiContext {
            store: store.clone(),
            relevant_rx: relevant_rx.clone(),
            events_tx: event_tx.clone(),
            reports,
            permission,
            metrics: metrics.clone(),
        };
        let bind_address = config.api_bind_address().to_string();
        let api_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = start_api_server(&bind_address, api_port, ctx, api_shutdown).await {
                tracing::error!(error = %e, "API server error");
            }
        });
    }

    // Start metrics reporter (lock-free reads with full summary)
    let metrics_clone = metrics.clone();
    let metrics_store = store.clone();
    let metrics_relevant = relevant_rx.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            let summary =
                metrics_clone.report(metrics_store.len(), metrics_relevant.borrow().len());
            summary.log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    info!("engine_started");

    // Run engine - consumes events until shutdown or channel close
    engine.run(event_rx, shutdown_rx).await;

    info!("healthwatch shutdown complete");
    Ok(())
}
