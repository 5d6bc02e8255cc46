//! Great-circle distance and radius containment
//!
//! Haversine on a spherical earth. Accuracy is limited by the spherical
//! approximation, which is sufficient for alert radii measured in kilometers;
//! no ellipsoid correction is applied.

use crate::domain::types::{Alert, Coordinates};

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// True iff the observer sits inside the alert's affected radius.
/// The boundary (distance == radius) counts as inside.
pub fn is_within_radius(observer: Coordinates, alert: &Alert) -> bool {
    distance_km(observer, alert.coordinates) <= alert.radius_km
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AlertId, Severity};
    use chrono::Utc;

    const TRIVANDRUM: Coordinates = Coordinates { lat: 8.5241, lng: 76.9366 };
    const KOCHI: Coordinates = Coordinates { lat: 9.9312, lng: 76.2673 };

    fn alert_at(coordinates: Coordinates, radius_km: f64) -> Alert {
        Alert {
            id: AlertId::from("t1"),
            title: "Test Alert".to_string(),
            location: "Test".to_string(),
            coordinates,
            radius_km,
            severity: Severity::Low,
            issued_at: Utc::now(),
            description: "test".to_string(),
            preventive_measures: vec![],
        }
    }

    #[test]
    fn test_distance_zero_for_identical_points() {
        assert_eq!(distance_km(TRIVANDRUM, TRIVANDRUM), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        assert_eq!(distance_km(TRIVANDRUM, KOCHI), distance_km(KOCHI, TRIVANDRUM));
    }

    #[test]
    fn test_distance_trivandrum_to_kochi() {
        // ~173 km along the Kerala coast
        let d = distance_km(TRIVANDRUM, KOCHI);
        assert!((d - 172.8).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_within_radius_at_center() {
        let alert = alert_at(TRIVANDRUM, 10.0);
        assert!(is_within_radius(TRIVANDRUM, &alert));
    }

    #[test]
    fn test_within_radius_boundary_inclusive() {
        let d = distance_km(TRIVANDRUM, KOCHI);
        let alert = alert_at(KOCHI, d);
        assert!(is_within_radius(TRIVANDRUM, &alert));
    }

    #[test]
    fn test_outside_radius() {
        let alert = alert_at(KOCHI, 5.0);
        assert!(!is_within_radius(TRIVANDRUM, &alert));
    }

    #[test]
    fn test_zero_radius_only_matches_center() {
        let alert = alert_at(TRIVANDRUM, 0.0);
        assert!(is_within_radius(TRIVANDRUM, &alert));
        assert!(!is_within_radius(KOCHI, &alert));
    }
}
