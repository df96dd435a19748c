//! Google-style directions API client
//!
//! One request per optimization: origin and destination are both the depot,
//! all stops are waypoints with the `optimize:` flag, and the response
//! carries the provider's chosen visiting order plus per-leg
//! distance (meters) and duration (seconds).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::types::{Coordinates, PickupStop};

use super::{DirectionsLeg, DirectionsService, OptimizedDirections};

/// Directions client configuration
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    /// Base URL of the directions endpoint
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl DirectionsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/directions/json".to_string(),
            api_key: api_key.into(),
            timeout_seconds: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Directions API client
pub struct GoogleDirectionsClient {
    client: Client,
    config: DirectionsConfig,
}

impl GoogleDirectionsClient {
    pub fn new(config: DirectionsConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the request URL for a waypoint-optimized round trip
    fn build_url(&self, depot: &Coordinates, stops: &[PickupStop]) -> String {
        let origin = format!("{},{}", depot.lat, depot.lng);

        let waypoints = stops
            .iter()
            .map(|s| format!("{},{}", s.coordinates.lat, s.coordinates.lng))
            .collect::<Vec<_>>()
            .join("|");

        format!(
            "{}?origin={}&destination={}&waypoints={}&key={}",
            self.config.base_url,
            urlencoding::encode(&origin),
            urlencoding::encode(&origin),
            urlencoding::encode(&format!("optimize:true|{}", waypoints)),
            self.config.api_key,
        )
    }
}

#[async_trait]
impl DirectionsService for GoogleDirectionsClient {
    async fn optimize_waypoints(
        &self,
        depot: &Coordinates,
        stops: &[PickupStop],
    ) -> Result<OptimizedDirections> {
        let url = self.build_url(depot, stops);

        debug!("Requesting optimized directions for {} stops", stops.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send directions request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Directions API returned HTTP {}: {}", status, body);
        }

        let directions: DirectionsResponse = response
            .json()
            .await
            .context("Failed to parse directions response")?;

        if directions.status != "OK" {
            anyhow::bail!("Directions API status: {}", directions.status);
        }

        let route = directions
            .routes
            .into_iter()
            .next()
            .context("Directions response contains no routes")?;

        if route.legs.len() != stops.len() + 1 {
            anyhow::bail!(
                "Directions response has {} legs for {} stops",
                route.legs.len(),
                stops.len()
            );
        }

        let legs = route
            .legs
            .iter()
            .map(|l| DirectionsLeg {
                distance_meters: l.distance.value,
                duration_seconds: l.duration.value,
            })
            .collect();

        debug!(
            "Directions API chose order {:?} over {} legs",
            route.waypoint_order,
            stops.len() + 1
        );

        Ok(OptimizedDirections {
            waypoint_order: route.waypoint_order,
            legs,
        })
    }

    fn name(&self) -> &str {
        "GoogleDirections"
    }
}

// Directions API response types

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    waypoint_order: Vec<usize>,
    legs: Vec<ResponseLeg>,
}

#[derive(Debug, Deserialize)]
struct ResponseLeg {
    distance: ValueField,
    duration: ValueField,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    /// Meters for distance, seconds for duration
    value: f64,
}
