//! External directions provider for waypoint-optimized routes
//!
//! The provider is optional: any transport error, non-OK status, or missing
//! credential makes the optimizer fall back to the local heuristic. Nothing
//! in this module surfaces to service callers.

mod google;

pub use google::{DirectionsConfig, GoogleDirectionsClient};

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Coordinates, PickupStop};

/// One leg of a provider-computed route, in provider units
#[derive(Debug, Clone, Copy)]
pub struct DirectionsLeg {
    /// Distance in meters
    pub distance_meters: f64,
    /// Duration in seconds
    pub duration_seconds: f64,
}

/// Provider response: the chosen visiting order plus per-leg figures.
///
/// `waypoint_order[i]` is the index into the submitted stop list of the
/// i-th visited stop. `legs` has one more entry than `waypoint_order` —
/// the final leg returns to the destination (the depot).
#[derive(Debug, Clone)]
pub struct OptimizedDirections {
    pub waypoint_order: Vec<usize>,
    pub legs: Vec<DirectionsLeg>,
}

/// Directions service trait for abstraction (Google-style API, mock, etc.)
#[async_trait]
pub trait DirectionsService: Send + Sync {
    /// Request one waypoint-optimized round trip: depot -> stops -> depot
    async fn optimize_waypoints(
        &self,
        depot: &Coordinates,
        stops: &[PickupStop],
    ) -> Result<OptimizedDirections>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// Mock directions service for tests.
///
/// Visits stops in a fixed order with fixed per-leg figures, or fails on
/// demand to exercise the heuristic fallback.
pub struct MockDirections {
    pub order: Vec<usize>,
    pub leg_distance_meters: f64,
    pub leg_duration_seconds: f64,
    pub fail: bool,
}

impl MockDirections {
    pub fn with_order(order: Vec<usize>) -> Self {
        Self {
            order,
            leg_distance_meters: 1500.0,
            leg_duration_seconds: 300.0,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            order: vec![],
            leg_distance_meters: 0.0,
            leg_duration_seconds: 0.0,
            fail: true,
        }
    }
}

#[async_trait]
impl DirectionsService for MockDirections {
    async fn optimize_waypoints(
        &self,
        _depot: &Coordinates,
        stops: &[PickupStop],
    ) -> Result<OptimizedDirections> {
        if self.fail {
            anyhow::bail!("mock directions failure");
        }
        if self.order.len() != stops.len() {
            anyhow::bail!(
                "mock order has {} entries for {} stops",
                self.order.len(),
                stops.len()
            );
        }

        let leg = DirectionsLeg {
            distance_meters: self.leg_distance_meters,
            duration_seconds: self.leg_duration_seconds,
        };

        Ok(OptimizedDirections {
            waypoint_order: self.order.clone(),
            // One leg per stop plus the return to the depot
            legs: vec![leg; stops.len() + 1],
        })
    }

    fn name(&self) -> &str {
        "MockDirections"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stop(lat: f64, lng: f64) -> PickupStop {
        PickupStop {
            pickup_request_id: Uuid::new_v4(),
            coordinates: Coordinates { lat, lng },
            address: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_requested_order() {
        let mock = MockDirections::with_order(vec![1, 0]);
        let depot = Coordinates { lat: -6.2088, lng: 106.8456 };
        let stops = vec![stop(-6.21, 106.85), stop(-6.25, 106.9)];

        let directions = mock.optimize_waypoints(&depot, &stops).await.unwrap();

        assert_eq!(directions.waypoint_order, vec![1, 0]);
        // stops + return leg
        assert_eq!(directions.legs.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockDirections::failing();
        let depot = Coordinates { lat: 0.0, lng: 0.0 };

        let result = mock.optimize_waypoints(&depot, &[stop(1.0, 1.0)]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_rejects_order_length_mismatch() {
        let mock = MockDirections::with_order(vec![0]);
        let depot = Coordinates { lat: 0.0, lng: 0.0 };
        let stops = vec![stop(1.0, 1.0), stop(2.0, 2.0)];

        let result = mock.optimize_waypoints(&depot, &stops).await;
        assert!(result.is_err());
    }
}
