use crate::error::LeaveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A capability a user holds inside the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Intern,
    Mentor,
    Supervisor,
    Hr,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Intern => "intern",
            Role::Mentor => "mentor",
            Role::Supervisor => "supervisor",
            Role::Hr => "hr",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "intern" => Ok(Role::Intern),
            "mentor" => Ok(Role::Mentor),
            "supervisor" => Ok(Role::Supervisor),
            "hr" => Ok(Role::Hr),
            "admin" => Ok(Role::Admin),
            other => Err(LeaveError::ValidationError(format!("Unknown role: {other}"))),
        }
    }
}

/// The set of roles a user holds. Membership is queried through [`RoleSet::has`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// Employment position. Interns go through an extra mentor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    Intern,
    CivilServant,
    GovernmentEmployee,
    Contractor,
}

impl Position {
    pub fn is_intern(&self) -> bool {
        matches!(self, Position::Intern)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Intern => "intern",
            Position::CivilServant => "civil-servant",
            Position::GovernmentEmployee => "government-employee",
            Position::Contractor => "contractor",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = LeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intern" => Ok(Position::Intern),
            "civil-servant" => Ok(Position::CivilServant),
            "government-employee" => Ok(Position::GovernmentEmployee),
            "contractor" => Ok(Position::Contractor),
            other => Err(LeaveError::ValidationError(format!(
                "Unknown position: {other}"
            ))),
        }
    }
}

/// A member of the organization as held by the user directory.
///
/// The password is kept in plaintext; this system makes no security claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub roles: RoleSet,
    pub position: Position,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<String>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        roles: RoleSet,
        position: Position,
        department: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles,
            position,
            department: department.into(),
            mentor: None,
            supervisor: None,
        }
    }

    pub fn with_mentor(mut self, mentor: impl Into<String>) -> Self {
        self.mentor = Some(mentor.into());
        self
    }

    pub fn with_supervisor(mut self, supervisor: impl Into<String>) -> Self {
        self.supervisor = Some(supervisor.into());
        self
    }

    /// True when the user's leave needs a mentor sign-off first.
    pub fn is_intern(&self) -> bool {
        self.position.is_intern() || self.roles.has(Role::Intern)
    }

    pub fn has(&self, role: Role) -> bool {
        self.roles.has(role)
    }
}

/// Registration payload. Every field is required except the assignments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub roles: Vec<Role>,
    pub position: Option<Position>,
    pub department: String,
    #[serde(default)]
    pub mentor: Option<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
}

impl NewUser {
    /// Trims and checks the payload, producing a directory entry.
    pub fn validate(self) -> Result<User, LeaveError> {
        let username = self.username.trim().to_string();
        let password = self.password.trim().to_string();
        let department = self.department.trim().to_string();

        if username.is_empty() || password.is_empty() || department.is_empty() {
            return Err(LeaveError::ValidationError(
                "username, password and department are required".to_string(),
            ));
        }
        if self.roles.is_empty() {
            return Err(LeaveError::ValidationError(
                "at least one role is required".to_string(),
            ));
        }
        let position = self
            .position
            .ok_or_else(|| LeaveError::ValidationError("position is required".to_string()))?;

        Ok(User {
            username,
            password,
            roles: self.roles.into_iter().collect(),
            position,
            department,
            mentor: self.mentor.filter(|m| !m.trim().is_empty()),
            supervisor: self.supervisor.filter(|s| !s.trim().is_empty()),
        })
    }
}
