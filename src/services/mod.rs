pub mod assignment;
pub mod codes;
pub mod directions;
pub mod geo;
pub mod optimizer;

pub use assignment::AssignmentService;
pub use optimizer::{OptimizerConfig, RouteOptimizer};
