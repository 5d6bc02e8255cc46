//! Mock health alert feed server
//!
//! Simulates the remote health alert service for local testing.
//!
//! Endpoints:
//! - GET  /alerts        - current alert set (JSON array)
//! - POST /submit-report - accepts {"location","description"}, mints a
//!                         confirmed alert and folds it into the feed
//!
//! Usage:
//!   cargo run --bin mock-feed -- --port 5000

use bytes::Bytes;
use clap::Parser;
use healthwatch::domain::seed;
use healthwatch::domain::types::{Alert, AlertId, Coordinates, Severity, SymptomReport};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "mock-feed")]
#[command(about = "Mock health alert feed service for local simulation")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Default radius for alerts minted from reports (km)
    #[arg(long, default_value = "5.0")]
    report_radius_km: f64,
}

/// Approximate district centers used when minting alerts from reports
const DISTRICT_CENTERS: [(&str, f64, f64); 14] = [
    ("Thiruvananthapuram", 8.5241, 76.9366),
    ("Kollam", 8.8932, 76.6141),
    ("Pathanamthitta", 9.2648, 76.7870),
    ("Alappuzha", 9.4981, 76.3388),
    ("Kottayam", 9.5916, 76.5222),
    ("Idukki", 9.8497, 76.9681),
    ("Ernakulam", 9.9816, 76.2999),
    ("Thrissur", 10.5276, 76.2144),
    ("Palakkad", 10.7867, 76.6548),
    ("Malappuram", 11.0510, 76.0711),
    ("Kozhikode", 11.2588, 75.7804),
    ("Wayanad", 11.6854, 76.1320),
    ("Kannur", 11.8745, 75.3704),
    ("Kasaragod", 12.4996, 74.9869),
];

fn district_center(location: &str) -> Coordinates {
    for (name, lat, lng) in DISTRICT_CENTERS {
        if name == location {
            return Coordinates { lat, lng };
        }
    }
    // Unknown locations land on Kochi so the feed stays usable
    Coordinates { lat: 9.9312, lng: 76.2673 }
}

struct FeedState {
    alerts: Mutex<Vec<Alert>>,
    report_radius_km: f64,
}

impl FeedState {
    fn mint_from_report(&self, report: &SymptomReport) -> Alert {
        Alert {
            id: AlertId(format!("report-{}", uuid::Uuid::now_v7())),
            title: format!("Symptom Reports: {}", report.location),
            location: report.location.clone(),
            coordinates: district_center(&report.location),
            radius_km: self.report_radius_km,
            severity: Severity::Medium,
            issued_at: chrono::Utc::now(),
            description: report.description.clone(),
            preventive_measures: vec![
                "Monitor symptoms and seek medical attention if they worsen".to_string(),
                "Avoid close contact with others in the affected area".to_string(),
            ],
        }
    }
}

type Response = hyper::Response<Full<Bytes>>;

fn json_response(status: StatusCode, body: String) -> Response {
    hyper::Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<FeedState>,
) -> Result<Response, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    Ok(match (method, path.as_str()) {
        (Method::GET, "/alerts") => {
            let alerts = state.alerts.lock().clone();
            println!("[MOCK] GET /alerts -> {} alerts", alerts.len());
            json_response(StatusCode::OK, serde_json::to_string(&alerts).unwrap_or_default())
        }
        (Method::POST, "/submit-report") => {
            let body = match req.into_body().collect().await {
                Ok(b) => b.to_bytes(),
                Err(_) => {
                    return Ok(json_response(
                        StatusCode::BAD_REQUEST,
                        r#"{"error":"unreadable body"}"#.to_string(),
                    ))
                }
            };
            let report: SymptomReport = match serde_json::from_slice(&body) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("[MOCK] Rejected report: {}", e);
                    return Ok(json_response(
                        StatusCode::BAD_REQUEST,
                        format!(r#"{{"error":"invalid report: {e}"}}"#),
                    ));
                }
            };

            let alert = state.mint_from_report(&report);
            println!("[MOCK] Report from {} -> alert {}", report.location, alert.id);
            state.alerts.lock().push(alert.clone());
            json_response(StatusCode::OK, serde_json::to_string(&alert).unwrap_or_default())
        }
        _ => json_response(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#.to_string()),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Seed the mock feed with the builtin alert set
    let state = Arc::new(FeedState {
        alerts: Mutex::new(seed::builtin()),
        report_radius_km: args.report_radius_km,
    });

    let listener = TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    println!("[MOCK] Health alert feed listening on port {}", args.port);
    println!("[MOCK] Serving {} seed alerts", state.alerts.lock().len());

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("[MOCK] HTTP error from {}: {}", peer, e);
            }
        });
    }
}
