//! Approval workflow engine.
//!
//! Builds the step plan for a new request, derives the aggregate status of a
//! step sequence, and applies approve/reject/override transitions. Every
//! function here is pure over its arguments; storage and sessions live in the
//! application layer.

use crate::domain::approval::{AggregateStatus, ApprovalStep, RoleKey, StepStatus};
use crate::domain::leave::LeaveRequest;
use crate::domain::user::{Role, User};
use crate::error::{LeaveError, Result};

/// Directory queries the plan builder needs.
pub trait ApproverLookup {
    /// Mentor for a request in `department`. `assigned` is the requester's
    /// explicit mentor and wins when it names a mentor.
    fn find_mentor(&self, department: &str, assigned: Option<&str>) -> Option<&User>;
    fn find_supervisor(&self, department: &str, assigned: Option<&str>) -> Option<&User>;
    fn find_hr(&self) -> Option<&User>;
}

/// Point-in-time snapshot of the user directory.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// First user holding `role` in `department`.
    pub fn by_role_and_dept(&self, role: Role, department: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.has(role) && u.department == department)
    }

    /// First user holding `role` anywhere.
    pub fn first_by_role(&self, role: Role) -> Option<&User> {
        self.users.iter().find(|u| u.has(role))
    }

    fn resolve(&self, role: Role, department: &str, assigned: Option<&str>) -> Option<&User> {
        assigned
            .and_then(|name| {
                self.users
                    .iter()
                    .find(|u| u.username == name && u.has(role))
            })
            .or_else(|| self.by_role_and_dept(role, department))
    }
}

impl ApproverLookup for Roster {
    fn find_mentor(&self, department: &str, assigned: Option<&str>) -> Option<&User> {
        self.resolve(Role::Mentor, department, assigned)
    }

    fn find_supervisor(&self, department: &str, assigned: Option<&str>) -> Option<&User> {
        self.resolve(Role::Supervisor, department, assigned)
    }

    fn find_hr(&self) -> Option<&User> {
        self.first_by_role(Role::Hr)
    }
}

/// Builds the ordered approval chain for `requester` filing in `department`.
///
/// Interns get `[mentor, supervisor, hr]`, everybody else `[supervisor, hr]`.
/// A missing supervisor is recorded as [`StepStatus::NoSupervisor`]. A missing
/// HR officer fails with [`LeaveError::NoHrApprover`] when `require_hr` is set
/// and leaves the step unassigned otherwise.
pub fn build_step_plan(
    requester: &User,
    department: &str,
    lookup: &impl ApproverLookup,
    require_hr: bool,
) -> Result<Vec<ApprovalStep>> {
    let mut steps = Vec::with_capacity(3);

    if requester.is_intern() {
        let mentor = lookup
            .find_mentor(department, requester.mentor.as_deref())
            .map(|u| u.username.clone());
        steps.push(ApprovalStep::new(RoleKey::Mentor, mentor, StepStatus::Pending));
    }

    let supervisor = lookup
        .find_supervisor(department, requester.supervisor.as_deref())
        .map(|u| u.username.clone());
    let supervisor_status = if supervisor.is_some() {
        StepStatus::Pending
    } else {
        StepStatus::NoSupervisor
    };
    steps.push(ApprovalStep::new(
        RoleKey::Supervisor,
        supervisor,
        supervisor_status,
    ));

    let hr = lookup.find_hr().map(|u| u.username.clone());
    if hr.is_none() && require_hr {
        return Err(LeaveError::NoHrApprover);
    }
    steps.push(ApprovalStep::new(RoleKey::Hr, hr, StepStatus::Pending));

    Ok(steps)
}

/// Derives the single status of a chain. A rejection anywhere wins; the chain
/// is approved once no step is pending.
pub fn aggregate_status(steps: &[ApprovalStep]) -> AggregateStatus {
    if steps.iter().any(|s| s.status == StepStatus::Rejected) {
        AggregateStatus::Rejected
    } else if steps.iter().all(|s| s.status.is_cleared()) {
        AggregateStatus::Approved
    } else {
        AggregateStatus::Pending
    }
}

fn set_matching(request: &mut LeaveRequest, key: RoleKey, status: StepStatus) -> usize {
    let mut touched = 0;
    for step in request.steps.iter_mut().filter(|s| s.role_key == key) {
        step.status = status;
        touched += 1;
    }
    touched
}

/// Marks every step owned by `key` as approved. Returns how many changed.
pub fn approve(request: &mut LeaveRequest, key: RoleKey) -> usize {
    set_matching(request, key, StepStatus::Approved)
}

/// Marks every step owned by `key` as rejected. Returns how many changed.
pub fn reject(request: &mut LeaveRequest, key: RoleKey) -> usize {
    set_matching(request, key, StepStatus::Rejected)
}

/// HR override: writes `status` into one step, whatever it held before.
pub fn manual_set_step(request: &mut LeaveRequest, index: usize, status: StepStatus) -> Result<()> {
    let id = request.id;
    let step = request
        .steps
        .get_mut(index)
        .ok_or(LeaveError::StepOutOfRange { id, index })?;
    step.status = status;
    Ok(())
}

/// HR toggle over the whole chain: pending and approved swap, every other
/// status is forced back to pending.
pub fn manual_cycle_all(request: &mut LeaveRequest) {
    for step in request.steps.iter_mut() {
        step.status = match step.status {
            StepStatus::Pending => StepStatus::Approved,
            StepStatus::Approved
            | StepStatus::Rejected
            | StepStatus::NotRequired
            | StepStatus::NoSupervisor => StepStatus::Pending,
        };
    }
}

/// Advances one step to the next status in rotation order.
pub fn rotate_step(request: &mut LeaveRequest, index: usize) -> Result<StepStatus> {
    let id = request.id;
    let step = request
        .steps
        .get_mut(index)
        .ok_or(LeaveError::StepOutOfRange { id, index })?;
    step.status = step.status.next();
    Ok(step.status)
}
