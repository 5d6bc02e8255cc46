//! Local control and display HTTP API
//!
//! The engine runs headless; this surface is how the platform layer feeds it
//! position and permission updates, submits symptom reports, and reads the
//! alert snapshots it renders. Snapshots are read-only; all mutation goes
//! through the engine's event channel or the documented store operations.

use crate::domain::types::{Alert, ObserverPosition, SymptomReport};
use crate::infra::metrics::Metrics;
use crate::io::permission::{PermissionState, SharedPermission};
use crate::services::alert_store::AlertStore;
use crate::services::engine::EngineEvent;
use crate::services::report::{ReportError, ReportIngestion};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

type Response = hyper::Response<Full<Bytes>>;

/// Shared handles the API operates on
pub struct ApiContext {
    pub store: Arc<AlertStore>,
    pub relevant_rx: watch::Receiver<Arc<Vec<Alert>>>,
    pub events_tx: mpsc::Sender<EngineEvent>,
    pub reports: Arc<ReportIngestion>,
    pub permission: Arc<SharedPermission>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
struct PermissionUpdate {
    state: PermissionState,
}

fn json_response(status: StatusCode, body: String) -> Response {
    hyper::Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(status, format!(r#"{{"ok":false,"error":{}}}"#, serde_json::json!(message)))
}

fn ok_response() -> Response {
    json_response(StatusCode::OK, r#"{"ok":true}"#.to_string())
}

async fn read_json<T: serde::de::DeserializeOwned>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, Response> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "unreadable body"))?;
    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &format!("invalid body: {e}")))
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    ctx: Arc<ApiContext>,
) -> Result<Response, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    Ok(match (method, path.as_str()) {
        (Method::GET, "/health") => ok_response(),
        (Method::GET, "/alerts") => {
            let snapshot = ctx.store.current();
            match serde_json::to_string(snapshot.as_ref()) {
                Ok(body) => json_response(StatusCode::OK, body),
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            }
        }
        (Method::GET, "/alerts/relevant") => {
            let snapshot = ctx.relevant_rx.borrow().clone();
            match serde_json::to_string(snapshot.as_ref()) {
                Ok(body) => json_response(StatusCode::OK, body),
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            }
        }
        (Method::POST, "/position") => {
            let position: ObserverPosition = match read_json(req).await {
                Ok(p) => p,
                Err(resp) => return Ok(resp),
            };
            // Position updates are last-wins; a full queue just means this
            // sample is superseded before it was processed
            match ctx.events_tx.try_send(EngineEvent::Position(position)) {
                Ok(()) => ok_response(),
                Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "engine busy"),
            }
        }
        (Method::DELETE, "/position") => {
            match ctx.events_tx.try_send(EngineEvent::PositionLost) {
                Ok(()) => ok_response(),
                Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "engine busy"),
            }
        }
        (Method::POST, "/report") => {
            let report: SymptomReport = match read_json(req).await {
                Ok(r) => r,
                Err(resp) => return Ok(resp),
            };
            match ctx.reports.submit(&report).await {
                Ok(alert) => {
                    ctx.metrics.record_report_accepted();
                    match serde_json::to_string(&alert) {
                        Ok(body) => json_response(StatusCode::OK, body),
                        Err(e) => {
                            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                        }
                    }
                }
                Err(ReportError::Validation(reason)) => {
                    ctx.metrics.record_report_failed();
                    error_response(StatusCode::UNPROCESSABLE_ENTITY, reason)
                }
                Err(ReportError::Transport(e)) => {
                    ctx.metrics.record_report_failed();
                    warn!(error = %e, "report_submission_failed");
                    error_response(StatusCode::BAD_GATEWAY, &e.to_string())
                }
            }
        }
        (Method::POST, "/permission") => {
            let update: PermissionUpdate = match read_json(req).await {
                Ok(u) => u,
                Err(resp) => return Ok(resp),
            };
            ctx.permission.set(update.state);
            info!(state = update.state.as_str(), "permission_updated");
            match ctx.events_tx.try_send(EngineEvent::PermissionChanged) {
                Ok(()) => ok_response(),
                Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "engine busy"),
            }
        }
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    })
}

/// Start the local API server
pub async fn start_api_server(
    bind_address: &str,
    port: u16,
    ctx: ApiContext,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = format!("{bind_address}:{port}").parse()?;
    let listener = TcpListener::bind(addr).await?;
    let ctx = Arc::new(ctx);

    info!(addr = %addr, "api_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let ctx = ctx.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let ctx = ctx.clone();
                                async move { handle_request(req, ctx).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "api_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "api_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("api_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
