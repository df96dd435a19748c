//! Route optimization
//!
//! Two strategies: a local nearest-neighbor heuristic (always available) and
//! a waypoint-optimized request to the external directions provider. The
//! provider is preferred when configured; any provider failure falls back to
//! the heuristic in full and is never visible to the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::services::directions::{DirectionsService, OptimizedDirections};
use crate::services::geo::{haversine_distance, round2, travel_time_minutes};
use crate::types::{Location, PickupStop, Route, RouteLeg, StopStatus};

/// Optimizer tuning knobs
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Assumed average speed in km/h for the heuristic
    pub average_speed_kmh: f64,
    /// Fixed per-stop service time in minutes for arrival projection
    pub stop_service_minutes: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: 30.0,
            stop_service_minutes: 15.0,
        }
    }
}

/// Route optimizer. Pure given its inputs; safe to share across tasks.
pub struct RouteOptimizer {
    config: OptimizerConfig,
    directions: Option<Arc<dyn DirectionsService>>,
}

impl RouteOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            directions: None,
        }
    }

    pub fn with_directions(mut self, directions: Arc<dyn DirectionsService>) -> Self {
        self.directions = Some(directions);
        self
    }

    /// Compute a visiting order with per-leg distance/duration and per-stop
    /// estimated arrivals. The depot is both start and end location.
    ///
    /// Callers are expected to reject empty stop sets; given one anyway this
    /// returns an empty route rather than failing.
    pub async fn optimize(
        &self,
        stops: &[PickupStop],
        depot: &Location,
        start_time: DateTime<Utc>,
        prefer_external: bool,
    ) -> Route {
        let mut route = match (&self.directions, prefer_external) {
            (Some(directions), true) => {
                match directions.optimize_waypoints(&depot.coordinates, stops).await {
                    Ok(optimized) => match route_from_directions(stops, depot, &optimized) {
                        Ok(route) => {
                            debug!(
                                provider = directions.name(),
                                stops = stops.len(),
                                "Route ordered by external provider"
                            );
                            route
                        }
                        Err(e) => {
                            warn!(
                                provider = directions.name(),
                                "Unusable directions response ({}), falling back to heuristic", e
                            );
                            nearest_neighbor_route(stops, depot, self.config.average_speed_kmh)
                        }
                    },
                    Err(e) => {
                        warn!(
                            provider = directions.name(),
                            "Directions request failed ({}), falling back to heuristic", e
                        );
                        nearest_neighbor_route(stops, depot, self.config.average_speed_kmh)
                    }
                }
            }
            _ => nearest_neighbor_route(stops, depot, self.config.average_speed_kmh),
        };

        calculate_estimated_arrivals(
            &mut route.legs,
            start_time,
            self.config.stop_service_minutes,
        );
        route
    }
}

/// Nearest-neighbor construction: repeatedly visit the closest unvisited
/// stop, then add the closing leg back to the depot into the totals only.
pub fn nearest_neighbor_route(
    stops: &[PickupStop],
    depot: &Location,
    average_speed_kmh: f64,
) -> Route {
    let mut remaining: Vec<&PickupStop> = stops.iter().collect();
    let mut legs: Vec<RouteLeg> = Vec::with_capacity(stops.len());

    let mut current = depot.coordinates;
    let mut total_distance = 0.0;
    let mut total_duration = 0.0;

    while !remaining.is_empty() {
        let (nearest_idx, distance) = remaining
            .iter()
            .enumerate()
            .map(|(i, s)| (i, haversine_distance(&current, &s.coordinates)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .expect("remaining is non-empty");

        let stop = remaining.swap_remove(nearest_idx);
        let distance_km = round2(distance);
        let duration_minutes = round2(travel_time_minutes(distance_km, average_speed_kmh));

        legs.push(RouteLeg {
            pickup_request_id: stop.pickup_request_id,
            sequence: legs.len() as i32 + 1,
            coordinates: stop.coordinates,
            address: stop.address.clone(),
            distance_km,
            duration_minutes,
            estimated_arrival: DateTime::<Utc>::MIN_UTC,
            status: StopStatus::Pending,
            actual_arrival: None,
            notes: None,
        });

        total_distance += distance_km;
        total_duration += duration_minutes;
        current = stop.coordinates;
    }

    // Closing leg back to the depot: counted in the totals, not materialized
    if !legs.is_empty() {
        let closing_km = round2(haversine_distance(&current, &depot.coordinates));
        total_distance += closing_km;
        total_duration += round2(travel_time_minutes(closing_km, average_speed_kmh));
    }

    Route {
        optimized: true,
        legs,
        total_distance_km: round2(total_distance),
        total_duration_minutes: round2(total_duration),
        start_location: depot.clone(),
        end_location: depot.clone(),
    }
}

/// Build a route from the provider's chosen order and per-leg figures.
/// Meters become km, seconds become minutes, both at 2-dp precision.
fn route_from_directions(
    stops: &[PickupStop],
    depot: &Location,
    directions: &OptimizedDirections,
) -> anyhow::Result<Route> {
    if directions.waypoint_order.len() != stops.len() {
        anyhow::bail!(
            "waypoint order has {} entries for {} stops",
            directions.waypoint_order.len(),
            stops.len()
        );
    }
    if directions.legs.len() != stops.len() + 1 {
        anyhow::bail!(
            "expected {} legs, got {}",
            stops.len() + 1,
            directions.legs.len()
        );
    }

    let mut legs: Vec<RouteLeg> = Vec::with_capacity(stops.len());
    let mut total_distance = 0.0;
    let mut total_duration = 0.0;

    for (position, &stop_idx) in directions.waypoint_order.iter().enumerate() {
        let stop = stops
            .get(stop_idx)
            .ok_or_else(|| anyhow::anyhow!("waypoint index {} out of range", stop_idx))?;
        let provider_leg = &directions.legs[position];

        let distance_km = round2(provider_leg.distance_meters / 1000.0);
        let duration_minutes = round2(provider_leg.duration_seconds / 60.0);

        legs.push(RouteLeg {
            pickup_request_id: stop.pickup_request_id,
            sequence: position as i32 + 1,
            coordinates: stop.coordinates,
            address: stop.address.clone(),
            distance_km,
            duration_minutes,
            estimated_arrival: DateTime::<Utc>::MIN_UTC,
            status: StopStatus::Pending,
            actual_arrival: None,
            notes: None,
        });

        total_distance += distance_km;
        total_duration += duration_minutes;
    }

    // Final provider leg returns to the depot; totals only
    if let Some(closing) = directions.legs.last() {
        if !legs.is_empty() {
            total_distance += round2(closing.distance_meters / 1000.0);
            total_duration += round2(closing.duration_seconds / 60.0);
        }
    }

    Ok(Route {
        optimized: true,
        legs,
        total_distance_km: round2(total_distance),
        total_duration_minutes: round2(total_duration),
        start_location: depot.clone(),
        end_location: depot.clone(),
    })
}

/// Project per-stop arrival times.
///
/// Walks legs in sequence from `start_time`: each leg's clock advance is its
/// own travel duration; the fixed service time is added after recording the
/// arrival, so it shows up in the next leg's projection but never in a leg's
/// own duration field.
pub fn calculate_estimated_arrivals(
    legs: &mut [RouteLeg],
    start_time: DateTime<Utc>,
    stop_service_minutes: f64,
) {
    let mut clock = start_time;
    let service = minutes_duration(stop_service_minutes);

    for leg in legs.iter_mut() {
        clock += minutes_duration(leg.duration_minutes);
        leg.estimated_arrival = clock;
        clock += service;
    }
}

fn minutes_duration(minutes: f64) -> Duration {
    Duration::milliseconds((minutes * 60_000.0) as i64)
}
