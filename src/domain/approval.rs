use crate::domain::user::Role;
use crate::error::LeaveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role that owns an approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKey {
    Mentor,
    Supervisor,
    Hr,
}

impl RoleKey {
    pub fn label(&self) -> &'static str {
        match self {
            RoleKey::Mentor => "Mentor",
            RoleKey::Supervisor => "Supervisor",
            RoleKey::Hr => "HR Officer",
        }
    }

    /// The directory role a user must hold to act on steps of this key.
    pub fn required_role(&self) -> Role {
        match self {
            RoleKey::Mentor => Role::Mentor,
            RoleKey::Supervisor => Role::Supervisor,
            RoleKey::Hr => Role::Hr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Mentor => "mentor",
            RoleKey::Supervisor => "supervisor",
            RoleKey::Hr => "hr",
        }
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKey {
    type Err = LeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mentor" => Ok(RoleKey::Mentor),
            "supervisor" => Ok(RoleKey::Supervisor),
            "hr" => Ok(RoleKey::Hr),
            other => Err(LeaveError::ValidationError(format!(
                "Unknown role key: {other}"
            ))),
        }
    }
}

/// Status of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    NotRequired,
    NoSupervisor,
}

impl StepStatus {
    /// Statuses that let the chain proceed.
    pub fn is_cleared(&self) -> bool {
        match self {
            StepStatus::Approved | StepStatus::NotRequired | StepStatus::NoSupervisor => true,
            StepStatus::Pending | StepStatus::Rejected => false,
        }
    }

    /// Successor in the HR rotation order.
    pub fn next(&self) -> Self {
        match self {
            StepStatus::Pending => StepStatus::Approved,
            StepStatus::Approved => StepStatus::Rejected,
            StepStatus::Rejected => StepStatus::NotRequired,
            StepStatus::NotRequired => StepStatus::NoSupervisor,
            StepStatus::NoSupervisor => StepStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Approved => "approved",
            StepStatus::Rejected => "rejected",
            StepStatus::NotRequired => "not-required",
            StepStatus::NoSupervisor => "no-supervisor",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = LeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "approved" => Ok(StepStatus::Approved),
            "rejected" => Ok(StepStatus::Rejected),
            "not-required" => Ok(StepStatus::NotRequired),
            "no-supervisor" => Ok(StepStatus::NoSupervisor),
            other => Err(LeaveError::ValidationError(format!(
                "Unknown step status: {other}"
            ))),
        }
    }
}

/// One checkpoint in a request's approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub role_label: String,
    pub role_key: RoleKey,
    pub assigned_username: Option<String>,
    pub status: StepStatus,
}

impl ApprovalStep {
    pub fn new(role_key: RoleKey, assigned_username: Option<String>, status: StepStatus) -> Self {
        Self {
            role_label: role_key.label().to_string(),
            role_key,
            assigned_username,
            status,
        }
    }
}

/// Single derived state of a whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Pending,
    Approved,
    Rejected,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Pending => "pending",
            AggregateStatus::Approved => "approved",
            AggregateStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_visits_every_status() {
        let mut status = StepStatus::Pending;
        let mut seen = vec![status];
        for _ in 0..4 {
            status = status.next();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                StepStatus::Pending,
                StepStatus::Approved,
                StepStatus::Rejected,
                StepStatus::NotRequired,
                StepStatus::NoSupervisor,
            ]
        );
        assert_eq!(status.next(), StepStatus::Pending);
    }

    #[test]
    fn test_status_serde_is_kebab_case() {
        let json = serde_json::to_string(&StepStatus::NoSupervisor).unwrap();
        assert_eq!(json, r#""no-supervisor""#);
        let parsed: StepStatus = "not-required".parse().unwrap();
        assert_eq!(parsed, StepStatus::NotRequired);
    }

    #[test]
    fn test_step_label_follows_key() {
        let step = ApprovalStep::new(RoleKey::Hr, None, StepStatus::Pending);
        assert_eq!(step.role_label, "HR Officer");
        assert_eq!(RoleKey::Supervisor.required_role(), Role::Supervisor);
    }
}
