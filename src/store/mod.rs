//! Storage contracts
//!
//! The document store itself is an external collaborator; this core only
//! consumes these narrow interfaces. `memory` provides in-process
//! implementations used by the test suite and by embedders that do not need
//! durable storage.

pub mod memory;

pub use memory::{MemoryAssignmentStore, MemoryRequestStore, StaticBranches};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{AssignmentStatus, Location, PickupAssignment, PickupRequest};

/// Assignment persistence
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<PickupAssignment>>;

    async fn insert(&self, assignment: &PickupAssignment) -> Result<()>;

    async fn update(&self, assignment: &PickupAssignment) -> Result<()>;

    /// Persist only while the stored status still equals `expected`;
    /// rejects with a validation error otherwise. Status transitions go
    /// through this so two callers cannot both succeed from a stale read.
    async fn update_checked(
        &self,
        assignment: &PickupAssignment,
        expected: AssignmentStatus,
    ) -> Result<()>;

    /// Lexicographically greatest existing code with the given prefix
    async fn latest_code_with_prefix(&self, prefix: &str) -> Result<Option<String>>;
}

/// Pickup request persistence.
///
/// Requests also serve as the stop source: their optional location/address
/// fields feed the optimizer, with the caller applying the zero-coordinate
/// fallback.
#[async_trait]
pub trait PickupRequestStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<PickupRequest>>;

    async fn update(&self, request: &PickupRequest) -> Result<()>;
}

/// Branch lookups: the short code used in assignment codes and the branch
/// location that serves as the route depot
#[async_trait]
pub trait BranchDirectory: Send + Sync {
    async fn branch_code(&self, branch_id: Uuid) -> Result<Option<String>>;

    async fn branch_location(&self, branch_id: Uuid) -> Result<Option<Location>>;
}
