//! Pickup assignment aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Coordinates, Route};

/// Assignment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Planned,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Allowed next statuses. Completed and cancelled are terminal.
    pub const fn allowed_transitions(self) -> &'static [AssignmentStatus] {
        match self {
            Self::Planned => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver and helpers working an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub driver_id: Uuid,
    #[serde(default)]
    pub helper_ids: Vec<Uuid>,
}

/// A GPS breadcrumb recorded during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsPoint {
    pub coordinates: Coordinates,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
}

/// A field issue reported during execution. Append-only; marked resolved
/// in place, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub issue_type: String,
    pub description: String,
    pub reported_by: Uuid,
    pub reported_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
}

/// Execution-phase state of an assignment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tracking: Vec<GpsPoint>,
    pub notes: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// An audit-log entry. Every mutating operation appends at least one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub action: String,
    pub actor: Uuid,
    pub timestamp: DateTime<Utc>,
    pub detail: Value,
}

impl ActivityRecord {
    pub fn new(action: impl Into<String>, actor: Uuid, detail: Value) -> Self {
        Self {
            action: action.into(),
            actor,
            timestamp: Utc::now(),
            detail,
        }
    }
}

/// Pickup assignment aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupAssignment {
    pub id: Uuid,
    /// Unique code, e.g. `PA230501JK0001`. Generated at creation,
    /// never changes.
    pub code: String,
    pub branch_id: Uuid,
    pub assignment_date: NaiveDate,
    pub team: Team,
    pub vehicle_id: Uuid,
    pub status: AssignmentStatus,
    pub pickup_request_ids: Vec<Uuid>,
    pub route: Option<Route>,
    #[serde(default)]
    pub execution: Execution,
    #[serde(default)]
    pub activity_history: Vec<ActivityRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PickupAssignment {
    pub fn push_activity(&mut self, record: ActivityRecord) {
        self.activity_history.push(record);
        self.updated_at = Utc::now();
    }

    pub fn has_pickup_request(&self, pickup_request_id: Uuid) -> bool {
        self.pickup_request_ids.contains(&pickup_request_id)
    }
}

/// Request to create an assignment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub branch_id: Uuid,
    pub assignment_date: NaiveDate,
    pub driver_id: Uuid,
    #[serde(default)]
    pub helper_ids: Vec<Uuid>,
    pub vehicle_id: Uuid,
    #[serde(default)]
    pub pickup_request_ids: Vec<Uuid>,
}
