//! In-memory store implementations
//!
//! Backed by `parking_lot::RwLock` maps. Each method takes the lock for the
//! whole read-modify-write, which gives the per-entity atomicity the
//! lifecycle manager relies on.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{AssignmentStatus, Location, PickupAssignment, PickupRequest};

use super::{AssignmentStore, BranchDirectory, PickupRequestStore};

/// In-memory assignment store
#[derive(Default)]
pub struct MemoryAssignmentStore {
    assignments: RwLock<HashMap<Uuid, PickupAssignment>>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assignments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.read().is_empty()
    }
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<PickupAssignment>> {
        Ok(self.assignments.read().get(&id).cloned())
    }

    async fn insert(&self, assignment: &PickupAssignment) -> Result<()> {
        let mut assignments = self.assignments.write();
        if assignments.contains_key(&assignment.id) {
            return Err(Error::Persistence(anyhow::anyhow!(
                "assignment {} already exists",
                assignment.id
            )));
        }
        assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn update(&self, assignment: &PickupAssignment) -> Result<()> {
        let mut assignments = self.assignments.write();
        if !assignments.contains_key(&assignment.id) {
            return Err(Error::not_found("assignment", assignment.id));
        }
        assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn update_checked(
        &self,
        assignment: &PickupAssignment,
        expected: AssignmentStatus,
    ) -> Result<()> {
        let mut assignments = self.assignments.write();
        let stored = assignments
            .get(&assignment.id)
            .ok_or_else(|| Error::not_found("assignment", assignment.id))?;

        if stored.status != expected {
            return Err(Error::validation(format!(
                "assignment {} status changed concurrently (expected {}, found {})",
                assignment.code, expected, stored.status
            )));
        }

        assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn latest_code_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let assignments = self.assignments.read();
        Ok(assignments
            .values()
            .filter(|a| a.code.starts_with(prefix))
            .map(|a| a.code.clone())
            .max())
    }
}

/// In-memory pickup request store
#[derive(Default)]
pub struct MemoryRequestStore {
    requests: RwLock<HashMap<Uuid, PickupRequest>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a request (fixture helper; the core never creates requests)
    pub fn seed(&self, request: PickupRequest) {
        self.requests.write().insert(request.id, request);
    }
}

#[async_trait]
impl PickupRequestStore for MemoryRequestStore {
    async fn get(&self, id: Uuid) -> Result<Option<PickupRequest>> {
        Ok(self.requests.read().get(&id).cloned())
    }

    async fn update(&self, request: &PickupRequest) -> Result<()> {
        let mut requests = self.requests.write();
        if !requests.contains_key(&request.id) {
            return Err(Error::not_found("pickup request", request.id));
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }
}

/// Fixed branch directory: id -> (code, depot location)
#[derive(Default)]
pub struct StaticBranches {
    branches: HashMap<Uuid, (String, Location)>,
}

impl StaticBranches {
    pub fn new(branches: impl IntoIterator<Item = (Uuid, String, Location)>) -> Self {
        Self {
            branches: branches
                .into_iter()
                .map(|(id, code, location)| (id, (code, location)))
                .collect(),
        }
    }

    pub fn single(branch_id: Uuid, code: impl Into<String>, location: Location) -> Self {
        Self::new([(branch_id, code.into(), location)])
    }
}

#[async_trait]
impl BranchDirectory for StaticBranches {
    async fn branch_code(&self, branch_id: Uuid) -> Result<Option<String>> {
        Ok(self.branches.get(&branch_id).map(|(code, _)| code.clone()))
    }

    async fn branch_location(&self, branch_id: Uuid) -> Result<Option<Location>> {
        Ok(self
            .branches
            .get(&branch_id)
            .map(|(_, location)| location.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Execution, Team};
    use chrono::{NaiveDate, Utc};

    fn assignment(code: &str, status: AssignmentStatus) -> PickupAssignment {
        PickupAssignment {
            id: Uuid::new_v4(),
            code: code.to_string(),
            branch_id: Uuid::new_v4(),
            assignment_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            team: Team {
                driver_id: Uuid::new_v4(),
                helper_ids: vec![],
            },
            vehicle_id: Uuid::new_v4(),
            status,
            pickup_request_ids: vec![],
            route: None,
            execution: Execution::default(),
            activity_history: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryAssignmentStore::new();
        let a = assignment("PA230501JK0001", AssignmentStatus::Planned);

        store.insert(&a).await.unwrap();

        let fetched = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(fetched.code, "PA230501JK0001");
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = MemoryAssignmentStore::new();
        let a = assignment("PA230501JK0001", AssignmentStatus::Planned);

        store.insert(&a).await.unwrap();
        let result = store.insert(&a).await;
        assert!(matches!(result, Err(Error::Persistence(_))));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryAssignmentStore::new();
        let a = assignment("PA230501JK0001", AssignmentStatus::Planned);

        let result = store.update(&a).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_checked_rejects_stale_status() {
        let store = MemoryAssignmentStore::new();
        let mut a = assignment("PA230501JK0001", AssignmentStatus::Planned);
        store.insert(&a).await.unwrap();

        // Another caller moved it to assigned
        a.status = AssignmentStatus::Assigned;
        store.update(&a).await.unwrap();

        // A writer still expecting `planned` must fail
        let mut stale = a.clone();
        stale.status = AssignmentStatus::Cancelled;
        let result = store
            .update_checked(&stale, AssignmentStatus::Planned)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        // The matching expectation succeeds
        store
            .update_checked(&stale, AssignmentStatus::Assigned)
            .await
            .unwrap();
        let stored = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssignmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_latest_code_with_prefix() {
        let store = MemoryAssignmentStore::new();
        store
            .insert(&assignment("PA230501JK0001", AssignmentStatus::Planned))
            .await
            .unwrap();
        store
            .insert(&assignment("PA230501JK0003", AssignmentStatus::Planned))
            .await
            .unwrap();
        store
            .insert(&assignment("PA230501SB0009", AssignmentStatus::Planned))
            .await
            .unwrap();

        let latest = store.latest_code_with_prefix("PA230501JK").await.unwrap();
        assert_eq!(latest, Some("PA230501JK0003".to_string()));

        let none = store.latest_code_with_prefix("PA230502JK").await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_static_branches() {
        let branch = Uuid::new_v4();
        let depot = Location {
            coordinates: crate::types::Coordinates { lat: -6.2088, lng: 106.8456 },
            address: "Jakarta Pusat depot".to_string(),
        };
        let directory = StaticBranches::single(branch, "JK", depot.clone());

        assert_eq!(
            directory.branch_code(branch).await.unwrap(),
            Some("JK".to_string())
        );
        assert_eq!(
            directory.branch_location(branch).await.unwrap(),
            Some(depot)
        );
        assert!(directory.branch_code(Uuid::new_v4()).await.unwrap().is_none());
        assert!(directory
            .branch_location(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_request_store_seed_and_update() {
        let store = MemoryRequestStore::new();
        let mut request = PickupRequest::new(Uuid::new_v4());
        store.seed(request.clone());

        request.status = crate::types::RequestStatus::Scheduled;
        store.update(&request).await.unwrap();

        let fetched = store.get(request.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, crate::types::RequestStatus::Scheduled);

        let missing = PickupRequest::new(Uuid::new_v4());
        assert!(matches!(
            store.update(&missing).await,
            Err(Error::NotFound { .. })
        ));
    }
}
