//! Pickup routing and assignment core for a logistics branch network.
//!
//! Two cooperating pieces:
//!
//! * [`services::RouteOptimizer`] orders a day's pickup stops from a branch
//!   depot, either through an external directions provider or a local
//!   nearest-neighbor heuristic, and projects per-stop arrival times.
//! * [`services::AssignmentService`] manages pickup assignments through
//!   their lifecycle (planned, assigned, in progress, completed, cancelled),
//!   keeps pickup-request back-pointers consistent, and records execution
//!   data from the field.
//!
//! Persistence is behind the traits in [`store`]; in-memory implementations
//! are provided for embedders and tests. Wiring it together:
//!
//! ```no_run
//! use std::sync::Arc;
//! use pickup_routing::config::Config;
//! use pickup_routing::services::{AssignmentService, OptimizerConfig, RouteOptimizer};
//! use pickup_routing::services::directions::{DirectionsConfig, GoogleDirectionsClient};
//! use pickup_routing::store::{MemoryAssignmentStore, MemoryRequestStore, StaticBranches};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//!
//! let mut optimizer = RouteOptimizer::new(OptimizerConfig {
//!     average_speed_kmh: config.average_speed_kmh,
//!     stop_service_minutes: config.stop_service_minutes,
//! });
//! if let Some(api_key) = &config.directions_api_key {
//!     let client = GoogleDirectionsClient::new(DirectionsConfig::new(api_key.clone()));
//!     optimizer = optimizer.with_directions(Arc::new(client));
//! }
//!
//! let service = AssignmentService::new(
//!     Arc::new(MemoryAssignmentStore::new()),
//!     Arc::new(MemoryRequestStore::new()),
//!     Arc::new(StaticBranches::default()),
//!     optimizer,
//! );
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use services::{AssignmentService, OptimizerConfig, RouteOptimizer};
