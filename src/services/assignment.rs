//! Pickup assignment lifecycle
//!
//! Owns the assignment state machine and the side effects around it:
//! keeping pickup-request back-pointers consistent with assignment
//! membership, invoking the route optimizer, and recording execution-phase
//! data (GPS breadcrumbs, per-stop status, field issues). Every mutating
//! operation appends an activity record.
//!
//! Status transitions re-read the persisted assignment immediately before
//! validation and write through `update_checked`, so two callers racing
//! from the same stale status cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::codes;
use crate::services::optimizer::RouteOptimizer;
use crate::store::{AssignmentStore, BranchDirectory, PickupRequestStore};
use crate::types::{
    ActivityRecord, AssignmentStatus, Coordinates, CreateAssignmentRequest, Execution, GpsPoint,
    Issue, PickupAssignment, PickupRequest, PickupStop, RequestStatus, StopStatus, Team,
};

/// Default reason stored on requests released by a cancellation
const DEFAULT_UNASSIGN_REASON: &str = "assignment cancelled";

/// Assignment lifecycle manager
pub struct AssignmentService {
    assignments: Arc<dyn AssignmentStore>,
    requests: Arc<dyn PickupRequestStore>,
    branches: Arc<dyn BranchDirectory>,
    optimizer: RouteOptimizer,
}

impl AssignmentService {
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        requests: Arc<dyn PickupRequestStore>,
        branches: Arc<dyn BranchDirectory>,
        optimizer: RouteOptimizer,
    ) -> Self {
        Self {
            assignments,
            requests,
            branches,
            optimizer,
        }
    }

    /// Create a new assignment at status `planned`.
    ///
    /// The code is generated from the branch code, the assignment date, and
    /// the day's sequence; an unknown branch aborts the whole operation
    /// before anything is persisted. Pickup requests supplied at creation
    /// are validated up front and then attached.
    pub async fn create(
        &self,
        data: CreateAssignmentRequest,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let branch_code = self
            .branches
            .branch_code(data.branch_id)
            .await?
            .ok_or_else(|| Error::not_found("branch", data.branch_id))?;

        let prefix = codes::code_prefix(&branch_code, data.assignment_date);
        let latest = self.assignments.latest_code_with_prefix(&prefix).await?;
        let code = codes::next_code(&branch_code, data.assignment_date, latest.as_deref());

        // Validate every supplied request before persisting anything
        let mut attached: Vec<PickupRequest> = Vec::with_capacity(data.pickup_request_ids.len());
        for &request_id in &data.pickup_request_ids {
            if attached.iter().any(|r| r.id == request_id) {
                return Err(Error::validation(format!(
                    "pickup request {} listed twice",
                    request_id
                )));
            }
            let request = self.fetch_request(request_id).await?;
            if request.is_attached() {
                return Err(Error::validation(format!(
                    "pickup request {} is already attached to an active assignment",
                    request_id
                )));
            }
            attached.push(request);
        }

        let now = Utc::now();
        let mut assignment = PickupAssignment {
            id: Uuid::new_v4(),
            code: code.clone(),
            branch_id: data.branch_id,
            assignment_date: data.assignment_date,
            team: Team {
                driver_id: data.driver_id,
                helper_ids: data.helper_ids,
            },
            vehicle_id: data.vehicle_id,
            status: AssignmentStatus::Planned,
            pickup_request_ids: data.pickup_request_ids.clone(),
            route: None,
            execution: Execution::default(),
            activity_history: vec![],
            created_at: now,
            updated_at: now,
        };
        assignment.push_activity(ActivityRecord::new(
            "created",
            actor,
            json!({ "code": code, "pickupRequests": assignment.pickup_request_ids.len() }),
        ));

        self.assignments.insert(&assignment).await?;

        for mut request in attached {
            attach_request(&mut request, &assignment, actor);
            if let Err(e) = self.requests.update(&request).await {
                error!(
                    code = %assignment.code,
                    request = %request.id,
                    "Assignment persisted but attaching pickup request failed: {}", e
                );
                return Err(e);
            }
        }

        info!(code = %assignment.code, "Pickup assignment created");
        Ok(assignment)
    }

    /// Move an assignment along the status state machine.
    ///
    /// `reason` is stored into `execution.notes` on cancellation and echoed
    /// on the `unassigned` activity of every released pickup request.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: AssignmentStatus,
        actor: Uuid,
        reason: Option<String>,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;
        let previous = assignment.status;

        if !previous.can_transition_to(new_status) {
            return Err(Error::InvalidTransition {
                from: previous,
                to: new_status,
            });
        }

        let now = Utc::now();
        assignment.status = new_status;
        match new_status {
            AssignmentStatus::InProgress => assignment.execution.start_time = Some(now),
            AssignmentStatus::Completed => assignment.execution.end_time = Some(now),
            AssignmentStatus::Cancelled => {
                if let Some(reason) = &reason {
                    assignment.execution.notes = Some(reason.clone());
                }
            }
            _ => {}
        }

        assignment.push_activity(ActivityRecord::new(
            "status_updated",
            actor,
            json!({
                "previousStatus": previous,
                "newStatus": new_status,
                "reason": reason,
            }),
        ));

        self.assignments.update_checked(&assignment, previous).await?;

        if new_status == AssignmentStatus::Cancelled {
            let unassign_reason = reason.as_deref().unwrap_or(DEFAULT_UNASSIGN_REASON);
            for &request_id in &assignment.pickup_request_ids {
                let mut request = match self.requests.get(request_id).await? {
                    Some(r) => r,
                    None => {
                        warn!(
                            code = %assignment.code,
                            request = %request_id,
                            "Referenced pickup request missing during cancellation"
                        );
                        continue;
                    }
                };
                if request.status != RequestStatus::Scheduled {
                    continue;
                }
                detach_request(&mut request, actor, unassign_reason);
                if let Err(e) = self.requests.update(&request).await {
                    error!(
                        code = %assignment.code,
                        request = %request_id,
                        "Assignment cancelled but releasing pickup request failed: {}", e
                    );
                    return Err(e);
                }
            }
        }

        info!(code = %assignment.code, from = %previous, to = %new_status, "Assignment status updated");
        Ok(assignment)
    }

    /// Attach a pickup request to an assignment.
    pub async fn add_pickup_request(
        &self,
        id: Uuid,
        pickup_request_id: Uuid,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        if assignment.status.is_terminal() {
            return Err(Error::validation(format!(
                "cannot modify {} assignment {}",
                assignment.status, assignment.code
            )));
        }
        if assignment.has_pickup_request(pickup_request_id) {
            return Err(Error::validation(format!(
                "pickup request {} is already in assignment {}",
                pickup_request_id, assignment.code
            )));
        }

        let mut request = self.fetch_request(pickup_request_id).await?;
        if request.is_attached() {
            return Err(Error::validation(format!(
                "pickup request {} is already attached to an active assignment",
                pickup_request_id
            )));
        }

        assignment.pickup_request_ids.push(pickup_request_id);
        assignment.push_activity(ActivityRecord::new(
            "pickup_request_added",
            actor,
            json!({ "pickupRequestId": pickup_request_id }),
        ));
        attach_request(&mut request, &assignment, actor);

        self.assignments.update(&assignment).await?;
        if let Err(e) = self.requests.update(&request).await {
            error!(
                code = %assignment.code,
                request = %pickup_request_id,
                "Assignment updated but attaching pickup request failed: {}", e
            );
            return Err(e);
        }

        Ok(assignment)
    }

    /// Detach a pickup request from an assignment, reverting it to pending.
    pub async fn remove_pickup_request(
        &self,
        id: Uuid,
        pickup_request_id: Uuid,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        if assignment.status.is_terminal() {
            return Err(Error::validation(format!(
                "cannot modify {} assignment {}",
                assignment.status, assignment.code
            )));
        }
        if !assignment.has_pickup_request(pickup_request_id) {
            return Err(Error::validation(format!(
                "pickup request {} is not in assignment {}",
                pickup_request_id, assignment.code
            )));
        }

        let mut request = self.fetch_request(pickup_request_id).await?;

        assignment
            .pickup_request_ids
            .retain(|&rid| rid != pickup_request_id);
        assignment.push_activity(ActivityRecord::new(
            "pickup_request_removed",
            actor,
            json!({ "pickupRequestId": pickup_request_id }),
        ));
        detach_request(&mut request, actor, "removed from assignment");

        self.assignments.update(&assignment).await?;
        if let Err(e) = self.requests.update(&request).await {
            error!(
                code = %assignment.code,
                request = %pickup_request_id,
                "Assignment updated but releasing pickup request failed: {}", e
            );
            return Err(e);
        }

        Ok(assignment)
    }

    /// Compute and store the assignment's route.
    ///
    /// Stops come from the assignment's pickup requests; a request without
    /// location data contributes a zero coordinate rather than failing. The
    /// route starts from the branch depot at the assignment date combined
    /// with the current wall-clock time of day.
    pub async fn optimize_assignment_route(
        &self,
        id: Uuid,
        actor: Uuid,
        prefer_external: bool,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        if assignment.pickup_request_ids.is_empty() {
            return Err(Error::validation(format!(
                "assignment {} has no pickup requests to optimize",
                assignment.code
            )));
        }

        let depot = self
            .branches
            .branch_location(assignment.branch_id)
            .await?
            .ok_or_else(|| Error::not_found("branch", assignment.branch_id))?;

        let mut stops: Vec<PickupStop> = Vec::with_capacity(assignment.pickup_request_ids.len());
        for &request_id in &assignment.pickup_request_ids {
            let request = self.fetch_request(request_id).await?;
            stops.push(PickupStop {
                pickup_request_id: request.id,
                coordinates: request.pickup_location.unwrap_or(Coordinates::ZERO),
                address: request.pickup_address.unwrap_or_default(),
            });
        }

        let start_time = derive_route_start(assignment.assignment_date, Utc::now());
        let route = self
            .optimizer
            .optimize(&stops, &depot, start_time, prefer_external)
            .await;

        assignment.push_activity(ActivityRecord::new(
            "route_optimized",
            actor,
            json!({
                "stops": route.legs.len(),
                "totalDistanceKm": route.total_distance_km,
                "totalDurationMinutes": route.total_duration_minutes,
            }),
        ));
        info!(
            code = %assignment.code,
            stops = route.legs.len(),
            distance_km = route.total_distance_km,
            "Assignment route optimized"
        );
        assignment.route = Some(route);

        self.assignments.update(&assignment).await?;
        Ok(assignment)
    }

    /// Record a GPS breadcrumb. Only valid while the assignment is
    /// in progress.
    pub async fn record_gps_location(
        &self,
        id: Uuid,
        coordinates: Coordinates,
        speed_kmh: Option<f64>,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let coordinates = coordinates.validated()?;
        let mut assignment = self.fetch_assignment(id).await?;

        if assignment.status != AssignmentStatus::InProgress {
            return Err(Error::validation(format!(
                "GPS recording requires an in-progress assignment (status is {})",
                assignment.status
            )));
        }

        assignment.execution.tracking.push(GpsPoint {
            coordinates,
            recorded_at: Utc::now(),
            speed_kmh,
        });
        assignment.push_activity(ActivityRecord::new(
            "gps_recorded",
            actor,
            json!({ "lat": coordinates.lat, "lng": coordinates.lng }),
        ));

        self.assignments.update(&assignment).await?;
        Ok(assignment)
    }

    /// Update the execution status of one route leg (looked up by its
    /// 1-based sequence number) and propagate a mapped status onto the
    /// referenced pickup request.
    pub async fn update_stop_status(
        &self,
        id: Uuid,
        sequence: i32,
        new_status: StopStatus,
        actor: Uuid,
        notes: Option<String>,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        let route = assignment.route.as_mut().ok_or_else(|| {
            Error::validation("assignment has no optimized route".to_string())
        })?;
        let leg = route
            .leg_by_sequence_mut(sequence)
            .ok_or_else(|| Error::not_found("route stop", sequence))?;

        let previous = leg.status;
        if !previous.can_transition_to(new_status) {
            return Err(Error::InvalidStopTransition {
                from: previous,
                to: new_status,
            });
        }

        leg.status = new_status;
        if new_status == StopStatus::InProgress {
            leg.actual_arrival = Some(Utc::now());
        }
        if notes.is_some() {
            leg.notes = notes.clone();
        }
        let request_id = leg.pickup_request_id;

        assignment.push_activity(ActivityRecord::new(
            "stop_status_updated",
            actor,
            json!({
                "sequence": sequence,
                "previousStatus": previous,
                "newStatus": new_status,
                "notes": notes,
            }),
        ));

        let mut request = self.fetch_request(request_id).await?;
        request.status = map_stop_status(new_status);
        request.updated_at = Utc::now();

        self.assignments.update(&assignment).await?;
        if let Err(e) = self.requests.update(&request).await {
            error!(
                code = %assignment.code,
                request = %request_id,
                "Stop status persisted but pickup request update failed: {}", e
            );
            return Err(e);
        }

        Ok(assignment)
    }

    /// Append a field issue to the assignment's execution record.
    pub async fn report_issue(
        &self,
        id: Uuid,
        issue_type: impl Into<String>,
        description: impl Into<String>,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        let issue_type = issue_type.into();
        assignment.execution.issues.push(Issue {
            issue_type: issue_type.clone(),
            description: description.into(),
            reported_by: actor,
            reported_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolution: None,
        });
        assignment.push_activity(ActivityRecord::new(
            "issue_reported",
            actor,
            json!({
                "issueType": issue_type,
                "issueIndex": assignment.execution.issues.len() - 1,
            }),
        ));

        self.assignments.update(&assignment).await?;
        Ok(assignment)
    }

    /// Mark an existing issue resolved. Issues are never removed.
    pub async fn resolve_issue(
        &self,
        id: Uuid,
        issue_index: usize,
        resolution: Option<String>,
        actor: Uuid,
    ) -> Result<PickupAssignment> {
        let mut assignment = self.fetch_assignment(id).await?;

        let issue = assignment
            .execution
            .issues
            .get_mut(issue_index)
            .ok_or_else(|| Error::not_found("issue", issue_index))?;

        if issue.resolved {
            return Err(Error::validation(format!(
                "issue {} is already resolved",
                issue_index
            )));
        }

        issue.resolved = true;
        issue.resolved_at = Some(Utc::now());
        issue.resolution = resolution.clone();

        assignment.push_activity(ActivityRecord::new(
            "issue_resolved",
            actor,
            json!({ "issueIndex": issue_index, "resolution": resolution }),
        ));

        self.assignments.update(&assignment).await?;
        Ok(assignment)
    }

    async fn fetch_assignment(&self, id: Uuid) -> Result<PickupAssignment> {
        self.assignments
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("assignment", id))
    }

    async fn fetch_request(&self, id: Uuid) -> Result<PickupRequest> {
        self.requests
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("pickup request", id))
    }
}

/// Mark a request scheduled under the given assignment and record it.
fn attach_request(request: &mut PickupRequest, assignment: &PickupAssignment, actor: Uuid) {
    request.status = RequestStatus::Scheduled;
    request.assignment = Some(crate::types::AssignmentRef {
        assignment_id: assignment.id,
        driver_id: assignment.team.driver_id,
        vehicle_id: assignment.vehicle_id,
        assigned_at: Utc::now(),
        assigned_by: actor,
    });
    request.push_activity(ActivityRecord::new(
        "assigned",
        actor,
        json!({ "assignmentCode": assignment.code }),
    ));
}

/// Revert a request to pending, clear its back-pointer, and record why.
fn detach_request(request: &mut PickupRequest, actor: Uuid, reason: &str) {
    request.status = RequestStatus::Pending;
    request.assignment = None;
    request.push_activity(ActivityRecord::new(
        "unassigned",
        actor,
        json!({ "reason": reason }),
    ));
}

/// Route start instant: the assignment's calendar date combined with the
/// current wall-clock time of day. This mirrors the source system, where
/// optimizing an assignment for another date still projects from today's
/// hour and minute.
fn derive_route_start(assignment_date: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
    assignment_date.and_time(now.time()).and_utc()
}

/// Stop outcomes propagate onto the pickup request; a skipped stop goes
/// back to pending so the request can be rescheduled.
fn map_stop_status(status: StopStatus) -> RequestStatus {
    match status {
        StopStatus::Pending => RequestStatus::Scheduled,
        StopStatus::InProgress => RequestStatus::InProgress,
        StopStatus::Completed => RequestStatus::Completed,
        StopStatus::Failed => RequestStatus::Failed,
        StopStatus::Skipped => RequestStatus::Pending,
    }
}
