//! Pickup request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ActivityRecord, Coordinates};

/// Pickup request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denormalized back-pointer from a pickup request to its active assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRef {
    pub assignment_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Uuid,
}

/// Pickup request entity
///
/// Only the fields this core reads and writes; the full document lives in
/// the request store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
    pub id: Uuid,
    pub status: RequestStatus,
    pub pickup_location: Option<Coordinates>,
    pub pickup_address: Option<String>,
    /// Present only while attached to an active assignment
    pub assignment: Option<AssignmentRef>,
    pub activity_history: Vec<ActivityRecord>,
    pub updated_at: DateTime<Utc>,
}

impl PickupRequest {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: RequestStatus::Pending,
            pickup_location: None,
            pickup_address: None,
            assignment: None,
            activity_history: vec![],
            updated_at: Utc::now(),
        }
    }

    /// True when the request is attached to an active assignment and must
    /// not be attached to another one.
    pub fn is_attached(&self) -> bool {
        self.status == RequestStatus::Scheduled && self.assignment.is_some()
    }

    pub fn push_activity(&mut self, record: ActivityRecord) {
        self.activity_history.push(record);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending_and_detached() {
        let request = PickupRequest::new(Uuid::new_v4());
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.assignment.is_none());
        assert!(!request.is_attached());
        assert!(request.activity_history.is_empty());
    }

    #[test]
    fn test_is_attached_requires_both_status_and_pointer() {
        let mut request = PickupRequest::new(Uuid::new_v4());

        request.status = RequestStatus::Scheduled;
        assert!(!request.is_attached());

        request.assignment = Some(AssignmentRef {
            assignment_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            assigned_at: Utc::now(),
            assigned_by: Uuid::new_v4(),
        });
        assert!(request.is_attached());

        request.status = RequestStatus::Completed;
        assert!(!request.is_attached());
    }

    #[test]
    fn test_request_status_serde_snake_case() {
        let json = serde_json::to_string(&RequestStatus::Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
    }

    #[test]
    fn test_assignment_ref_serializes_camel_case() {
        let backref = AssignmentRef {
            assignment_id: Uuid::nil(),
            driver_id: Uuid::nil(),
            vehicle_id: Uuid::nil(),
            assigned_at: Utc::now(),
            assigned_by: Uuid::nil(),
        };
        let json = serde_json::to_string(&backref).unwrap();
        assert!(json.contains("\"assignmentId\""));
        assert!(json.contains("\"assignedBy\""));
    }
}
