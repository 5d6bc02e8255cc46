//! Shared types for the health alert engine

use chrono::{DateTime, Utc};
use rustc_hash::FxHasher;
use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

/// Districts accepted as symptom report locations
pub const DISTRICTS: [&str; 14] = [
    "Thiruvananthapuram",
    "Kollam",
    "Pathanamthitta",
    "Alappuzha",
    "Kottayam",
    "Idukki",
    "Ernakulam",
    "Thrissur",
    "Palakkad",
    "Malappuram",
    "Kozhikode",
    "Wayanad",
    "Kannur",
    "Kasaragod",
];

/// Newtype wrapper for alert identities to provide type safety
///
/// The feed encodes identities as either JSON strings or numbers;
/// both deserialize to the canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[repr(transparent)]
pub struct AlertId(pub String);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        AlertId(s.to_string())
    }
}

impl<'de> Deserialize<'de> for AlertId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = AlertId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or integer alert id")
            }

            fn visit_str<E>(self, value: &str) -> Result<AlertId, E>
            where
                E: de::Error,
            {
                Ok(AlertId(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<AlertId, E>
            where
                E: de::Error,
            {
                Ok(AlertId(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<AlertId, E>
            where
                E: de::Error,
            {
                Ok(AlertId(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<AlertId, E>
            where
                E: de::Error,
            {
                Ok(AlertId(value.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A geotagged hazard notice with a severity and an affected radius
///
/// Immutable once stored; a re-issued alert under the same identity is a
/// distinct value with a different content fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    /// Human-readable location label
    pub location: String,
    pub coordinates: Coordinates,
    /// Affected radius in kilometers
    #[serde(alias = "radius")]
    pub radius_km: f64,
    pub severity: Severity,
    #[serde(alias = "timestamp")]
    pub issued_at: DateTime<Utc>,
    pub description: String,
    #[serde(alias = "preventiveMeasures", default)]
    pub preventive_measures: Vec<String>,
}

impl Alert {
    /// Digest over the mutable content fields (title, description, severity).
    ///
    /// A re-issued alert with the same identity but changed content hashes
    /// differently and becomes eligible for one more delivery.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.title.hash(&mut hasher);
        self.description.hash(&mut hasher);
        self.severity.as_str().hash(&mut hasher);
        hasher.finish()
    }

    /// Validate field ranges for an alert arriving from an external boundary
    pub fn validate(&self) -> Result<(), String> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(format!("radius must be >= 0, got {}", self.radius_km));
        }
        if !(-90.0..=90.0).contains(&self.coordinates.lat) {
            return Err(format!("latitude out of range: {}", self.coordinates.lat));
        }
        if !(-180.0..=180.0).contains(&self.coordinates.lng) {
            return Err(format!("longitude out of range: {}", self.coordinates.lng));
        }
        if self.title.trim().is_empty() {
            return Err("title is empty".to_string());
        }
        Ok(())
    }
}

/// Last known observer position, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPosition {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl ObserverPosition {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lng: self.lng }
    }
}

/// Observer-authored symptom report, consumed once by report ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomReport {
    pub location: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alert() -> Alert {
        Alert {
            id: AlertId::from("1"),
            title: "Dengue Outbreak Alert".to_string(),
            location: "Thiruvananthapuram".to_string(),
            coordinates: Coordinates { lat: 8.5241, lng: 76.9366 },
            radius_km: 10.0,
            severity: Severity::High,
            issued_at: Utc::now(),
            description: "Multiple cases reported.".to_string(),
            preventive_measures: vec!["Use mosquito nets".to_string()],
        }
    }

    #[test]
    fn test_alert_id_from_string_json() {
        let id: AlertId = serde_json::from_str(r#""abc-1""#).unwrap();
        assert_eq!(id, AlertId::from("abc-1"));
    }

    #[test]
    fn test_alert_id_from_number_json() {
        let id: AlertId = serde_json::from_str("42").unwrap();
        assert_eq!(id, AlertId::from("42"));
    }

    #[test]
    fn test_fingerprint_stable() {
        let alert = sample_alert();
        assert_eq!(alert.fingerprint(), alert.clone().fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let alert = sample_alert();
        let mut reissued = alert.clone();
        reissued.description = "Case count rising, avoid standing water.".to_string();
        assert_ne!(alert.fingerprint(), reissued.fingerprint());

        // Coordinates are not part of the content fingerprint
        let mut moved = alert.clone();
        moved.coordinates.lat += 0.5;
        assert_eq!(alert.fingerprint(), moved.fingerprint());
    }

    #[test]
    fn test_validate_rejects_negative_radius() {
        let mut alert = sample_alert();
        alert.radius_km = -1.0;
        assert!(alert.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_coordinates() {
        let mut alert = sample_alert();
        alert.coordinates.lat = 120.0;
        assert!(alert.validate().is_err());
    }

    #[test]
    fn test_alert_accepts_legacy_field_names() {
        let json = r#"{
            "id": 7,
            "title": "Test Alert",
            "location": "Kochi",
            "coordinates": {"lat": 9.9312, "lng": 76.2673},
            "radius": 5,
            "severity": "medium",
            "timestamp": "2026-08-01T10:00:00Z",
            "description": "test",
            "preventiveMeasures": ["boil water"]
        }"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.id, AlertId::from("7"));
        assert_eq!(alert.radius_km, 5.0);
        assert_eq!(alert.preventive_measures, vec!["boil water".to_string()]);
    }
}
