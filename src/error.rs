//! Error taxonomy for the pickup routing core
//!
//! Validation and not-found conditions are raised before any mutation is
//! applied. Directions-provider failures never appear here — the optimizer
//! recovers them internally by falling back to the local heuristic.
//! Persistence errors are passed through from the store unchanged.

use thiserror::Error;

use crate::types::{AssignmentStatus, StopStatus};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AssignmentStatus,
        to: AssignmentStatus,
    },

    #[error("invalid stop status transition: {from} -> {to}")]
    InvalidStopTransition { from: StopStatus, to: StopStatus },

    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for conditions the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}
