//! Route types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Placeholder used when a pickup request has no location data
    pub const ZERO: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    /// Build from a GeoJSON-style `[longitude, latitude]` pair,
    /// validating the ranges.
    pub fn from_lon_lat(pair: [f64; 2]) -> Result<Self> {
        let [lng, lat] = pair;
        Self { lat, lng }.validated()
    }

    /// Range-check the pair: [-180, 180] longitude, [-90, 90] latitude
    pub fn validated(self) -> Result<Self> {
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::validation(format!(
                "longitude out of range [-180, 180]: {}",
                self.lng
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::validation(format!(
                "latitude out of range [-90, 90]: {}",
                self.lat
            )));
        }
        Ok(self)
    }

    /// As a GeoJSON-style `[longitude, latitude]` pair
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// A named location (depot, route start/end)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub coordinates: Coordinates,
    pub address: String,
}

/// A pickup location to visit. Immutable optimizer input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStop {
    pub pickup_request_id: Uuid,
    pub coordinates: Coordinates,
    pub address: String,
}

/// Execution status of a single route leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
    Failed,
}

impl StopStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Allowed next statuses for a leg
    pub const fn allowed_transitions(self) -> &'static [StopStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Skipped],
            Self::InProgress => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Skipped | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(self, next: StopStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for StopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One traversed edge of the route, arriving at a pickup stop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub pickup_request_id: Uuid,
    /// Order in route (1-based)
    pub sequence: i32,
    pub coordinates: Coordinates,
    pub address: String,
    /// Distance from the previous position in km (2 decimal places)
    pub distance_km: f64,
    /// Travel duration from the previous position in minutes (2 decimal places)
    pub duration_minutes: f64,
    pub estimated_arrival: DateTime<Utc>,
    pub status: StopStatus,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Optimized route stored on an assignment.
///
/// Totals include the closing leg from the last stop back to the end
/// location; that closing leg is never materialized as a `RouteLeg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub optimized: bool,
    pub legs: Vec<RouteLeg>,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    pub start_location: Location,
    pub end_location: Location,
}

impl Route {
    /// Find a leg by its 1-based sequence number
    pub fn leg_by_sequence(&self, sequence: i32) -> Option<&RouteLeg> {
        self.legs.iter().find(|l| l.sequence == sequence)
    }

    pub fn leg_by_sequence_mut(&mut self, sequence: i32) -> Option<&mut RouteLeg> {
        self.legs.iter_mut().find(|l| l.sequence == sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_from_lon_lat_valid() {
        let coords = Coordinates::from_lon_lat([106.8456, -6.2088]).unwrap();
        assert!((coords.lng - 106.8456).abs() < 1e-9);
        assert!((coords.lat - -6.2088).abs() < 1e-9);
    }

    #[test]
    fn test_coordinates_rejects_bad_longitude() {
        let result = Coordinates::from_lon_lat([181.0, 0.0]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_coordinates_rejects_bad_latitude() {
        let result = Coordinates::from_lon_lat([0.0, -90.5]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_validated_passes_through_in_range_pair() {
        let coords = Coordinates { lat: -6.2088, lng: 106.8456 };
        assert_eq!(coords.validated().unwrap(), coords);

        let bad = Coordinates { lat: 500.0, lng: 999.0 };
        assert!(matches!(bad.validated(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_coordinates_lon_lat_roundtrip() {
        let coords = Coordinates::from_lon_lat([14.4378, 50.0755]).unwrap();
        let pair = coords.to_lon_lat();
        assert!((pair[0] - 14.4378).abs() < 1e-9);
        assert!((pair[1] - 50.0755).abs() < 1e-9);
    }

    #[test]
    fn test_stop_status_transitions() {
        assert!(StopStatus::Pending.can_transition_to(StopStatus::InProgress));
        assert!(StopStatus::Pending.can_transition_to(StopStatus::Skipped));
        assert!(StopStatus::InProgress.can_transition_to(StopStatus::Completed));
        assert!(StopStatus::InProgress.can_transition_to(StopStatus::Failed));

        assert!(!StopStatus::Pending.can_transition_to(StopStatus::Completed));
        assert!(!StopStatus::Completed.can_transition_to(StopStatus::InProgress));
        assert!(!StopStatus::Skipped.can_transition_to(StopStatus::Pending));
        assert!(!StopStatus::Failed.can_transition_to(StopStatus::InProgress));
    }

    #[test]
    fn test_stop_status_serde_snake_case() {
        let json = serde_json::to_string(&StopStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: StopStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StopStatus::InProgress);
    }

    #[test]
    fn test_route_leg_serializes_camel_case() {
        let leg = RouteLeg {
            pickup_request_id: Uuid::nil(),
            sequence: 1,
            coordinates: Coordinates { lat: -6.21, lng: 106.85 },
            address: "Jl. Sudirman 1".to_string(),
            distance_km: 1.23,
            duration_minutes: 2.46,
            estimated_arrival: Utc::now(),
            status: StopStatus::Pending,
            actual_arrival: None,
            notes: None,
        };
        let json = serde_json::to_string(&leg).unwrap();
        assert!(json.contains("\"pickupRequestId\""));
        assert!(json.contains("\"distanceKm\":1.23"));
        assert!(json.contains("\"estimatedArrival\""));
    }

    #[test]
    fn test_leg_by_sequence() {
        let mk_leg = |seq: i32| RouteLeg {
            pickup_request_id: Uuid::new_v4(),
            sequence: seq,
            coordinates: Coordinates::ZERO,
            address: String::new(),
            distance_km: 0.0,
            duration_minutes: 0.0,
            estimated_arrival: Utc::now(),
            status: StopStatus::Pending,
            actual_arrival: None,
            notes: None,
        };
        let route = Route {
            optimized: true,
            legs: vec![mk_leg(1), mk_leg(2)],
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
            start_location: Location {
                coordinates: Coordinates::ZERO,
                address: "depot".to_string(),
            },
            end_location: Location {
                coordinates: Coordinates::ZERO,
                address: "depot".to_string(),
            },
        };

        assert_eq!(route.leg_by_sequence(2).unwrap().sequence, 2);
        assert!(route.leg_by_sequence(3).is_none());
    }
}
