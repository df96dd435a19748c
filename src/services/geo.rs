//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimate travel time in minutes at the given average speed
pub fn travel_time_minutes(distance_km: f64, average_speed_kmh: f64) -> f64 {
    (distance_km / average_speed_kmh) * 60.0
}

/// Round to two decimal places, matching the stored route precision
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_prague_brno() {
        let prague = Coordinates { lat: 50.0755, lng: 14.4378 };
        let brno = Coordinates { lat: 49.1951, lng: 16.6068 };

        let distance = haversine_distance(&prague, &brno);

        // Prague to Brno is approximately 185 km
        assert!((distance - 185.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates { lat: 50.0, lng: 14.0 };
        let distance = haversine_distance(&point, &point);
        assert!((distance - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_haversine_symmetric() {
        let jakarta = Coordinates { lat: -6.2088, lng: 106.8456 };
        let bandung = Coordinates { lat: -6.9175, lng: 107.6191 };

        let forward = haversine_distance(&jakarta, &bandung);
        let backward = haversine_distance(&bandung, &jakarta);

        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_travel_time() {
        // 30 km at 30 km/h is exactly one hour
        let time = travel_time_minutes(30.0, 30.0);
        assert!((time - 60.0).abs() < 1e-9);

        // faster speed, shorter time
        assert!(travel_time_minutes(30.0, 60.0) < time);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234567), 1.23);
        assert_eq!(round2(1.235), 1.24);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(99.999), 100.0);
    }
}
