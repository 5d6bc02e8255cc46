//! Builtin seed alerts and seed file loading
//!
//! The engine always starts from a known alert set. By default that is the
//! builtin Kerala set below; a JSON file (array of alerts) can override it
//! via the `[seed]` config section.

use crate::domain::types::{Alert, AlertId, Coordinates, Severity};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Builtin seed alert set
pub fn builtin() -> Vec<Alert> {
    let now = Utc::now();
    vec![
        Alert {
            id: AlertId::from("1"),
            title: "Dengue Outbreak Alert".to_string(),
            location: "Thiruvananthapuram".to_string(),
            coordinates: Coordinates { lat: 8.5241, lng: 76.9366 },
            radius_km: 10.0,
            severity: Severity::High,
            issued_at: now - Duration::hours(2),
            description: "Multiple cases of dengue fever reported in the area. \
                          Please take necessary precautions."
                .to_string(),
            preventive_measures: vec![
                "Eliminate standing water around homes".to_string(),
                "Use mosquito nets and repellents".to_string(),
                "Wear long-sleeved clothes".to_string(),
                "Keep surroundings clean and free from water containers".to_string(),
            ],
        },
        Alert {
            id: AlertId::from("2"),
            title: "Water Quality Warning".to_string(),
            location: "Kochi".to_string(),
            coordinates: Coordinates { lat: 9.9312, lng: 76.2673 },
            radius_km: 5.0,
            severity: Severity::Medium,
            issued_at: now - Duration::hours(5),
            description: "Elevated levels of contaminants detected in local water supply."
                .to_string(),
            preventive_measures: vec![
                "Boil water before drinking".to_string(),
                "Use water purifiers".to_string(),
                "Avoid direct consumption of tap water".to_string(),
                "Store water in clean containers".to_string(),
            ],
        },
        Alert {
            id: AlertId::from("3"),
            title: "Leptospirosis Risk".to_string(),
            location: "Kozhikode".to_string(),
            coordinates: Coordinates { lat: 11.2588, lng: 75.7804 },
            radius_km: 8.0,
            severity: Severity::Low,
            issued_at: now - Duration::days(1),
            description: "Increased risk of leptospirosis due to recent flooding.".to_string(),
            preventive_measures: vec![
                "Wear protective footwear".to_string(),
                "Avoid wading in flood water".to_string(),
                "Cover any open wounds".to_string(),
                "Seek immediate medical attention if symptoms appear".to_string(),
            ],
        },
    ]
}

/// Load a seed set from a JSON file (array of alerts)
pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Alert>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;

    let alerts: Vec<Alert> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

    for alert in &alerts {
        alert
            .validate()
            .map_err(|reason| anyhow::anyhow!("invalid seed alert {}: {reason}", alert.id))?;
    }

    Ok(alerts)
}

/// Resolve the seed set: configured file if present, builtin otherwise.
/// An unreadable file falls back to the builtin set with a warning.
pub fn load(seed_file: Option<&str>) -> Vec<Alert> {
    match seed_file {
        Some(path) => match from_file(path) {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "seed_file_load_failed");
                builtin()
            }
        },
        None => builtin(),
    }
}
